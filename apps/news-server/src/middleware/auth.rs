//! Session handling and the current-actor extractor.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;

use news_core::policy::Actor;
use news_core::ports::TokenService;

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "news_session";

/// Who a valid session token says the caller is.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i32,
}

impl Identity {
    /// Read the session cookie, falling back to a `Bearer` header.
    /// Missing, expired and forged tokens all mean "anonymous".
    pub fn from_request(req: &HttpRequest, tokens: &dyn TokenService) -> Option<Self> {
        let token = match req.cookie(SESSION_COOKIE) {
            Some(cookie) => cookie.value().to_string(),
            None => req
                .headers()
                .get(header::AUTHORIZATION)?
                .to_str()
                .ok()?
                .strip_prefix("Bearer ")?
                .to_string(),
        };

        match tokens.validate_token(&token) {
            Ok(claims) => Some(Self {
                user_id: claims.user_id,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring session token");
                None
            }
        }
    }
}

/// The logged-in actor, if any.
///
/// Never rejects a request; authorization happens in the services.
pub struct CurrentActor(pub Option<Actor>);

impl CurrentActor {
    pub fn get(&self) -> Option<&Actor> {
        self.0.as_ref()
    }

    pub fn username(&self) -> Option<String> {
        self.0.as_ref().map(|a| a.user.username.clone())
    }
}

impl FromRequest for CurrentActor {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
            tracing::error!("AppState not found in app data");
            return Box::pin(async { Err(AppError::Internal("Server configuration error".into())) });
        };
        let identity = Identity::from_request(req, state.tokens.as_ref());

        Box::pin(async move {
            let Some(identity) = identity else {
                return Ok(CurrentActor(None));
            };
            let actor = state.accounts.actor(identity.user_id).await?;
            if actor.is_none() {
                tracing::debug!(user_id = identity.user_id, "Session for a deleted user");
            }
            Ok(CurrentActor(actor))
        })
    }
}

/// HttpOnly cookie carrying a fresh session token.
pub fn session_cookie(token: String, max_age_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(max_age_seconds))
        .finish()
}

/// Expired cookie that ends the session.
pub fn cleared_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie
}
