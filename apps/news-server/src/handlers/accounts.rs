//! Signup, login, logout and the upgrade to authorship.

use actix_web::{HttpResponse, http::header, web};

use news_core::domain::User;
use news_core::error::DomainError;
use news_core::forms::{FormErrors, LoginForm, SignupDraft, field};

use super::{Pairs, redirect};
use crate::middleware::auth::{CurrentActor, cleared_session_cookie, session_cookie};
use crate::middleware::error::{AppError, AppResult};
use crate::pages::{LoginPage, MENU, SignupPage, TemplateExt};
use crate::state::AppState;

/// Only same-site paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") =>
        {
            path
        }
        _ => "/",
    }
}

/// Redirect to `location` with a fresh session for `user`.
fn start_session(state: &AppState, user: &User, location: &str) -> AppResult<HttpResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let cookie = session_cookie(token, state.tokens.expiration_seconds(), state.cookie_secure);

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish())
}

fn signup_page(actor: &CurrentActor, draft: &SignupDraft, errors: FormErrors) -> HttpResponse {
    SignupPage {
        menu: MENU,
        username: actor.username(),
        login: draft.username.clone(),
        email: draft.email.clone(),
        become_author: draft.become_author,
        errors,
    }
    .to_response()
}

fn login_page(actor: &CurrentActor, login: String, next: &str, errors: FormErrors) -> HttpResponse {
    LoginPage {
        menu: MENU,
        username: actor.username(),
        login,
        next: next.to_string(),
        errors,
    }
    .to_response()
}

/// GET /accounts/signup/
pub async fn signup_form(actor: CurrentActor) -> HttpResponse {
    signup_page(&actor, &SignupDraft::default(), FormErrors::new())
}

/// POST /accounts/signup/
pub async fn signup(
    state: web::Data<AppState>,
    actor: CurrentActor,
    form: web::Form<Pairs>,
) -> AppResult<HttpResponse> {
    let draft = SignupDraft::from_pairs(&form.0);
    let signup = match draft.validate() {
        Ok(signup) => signup,
        Err(errors) => return Ok(signup_page(&actor, &draft, errors)),
    };

    match state.accounts.signup(signup).await {
        Ok(user) => start_session(&state, &user, "/"),
        Err(DomainError::Validation(errors)) => Ok(signup_page(&actor, &draft, errors)),
        Err(e) => Err(e.into()),
    }
}

/// GET /accounts/login/
pub async fn login_form(actor: CurrentActor, query: web::Query<Pairs>) -> HttpResponse {
    let next = safe_next(field(&query.0, "next"));
    login_page(&actor, String::new(), next, FormErrors::new())
}

/// POST /accounts/login/
pub async fn login(
    state: web::Data<AppState>,
    actor: CurrentActor,
    form: web::Form<Pairs>,
) -> AppResult<HttpResponse> {
    let pairs = form.into_inner();
    let next = safe_next(field(&pairs, "next"));
    let login = field(&pairs, "username").unwrap_or_default().trim().to_string();

    let credentials = match LoginForm::parse(&pairs) {
        Ok(credentials) => credentials,
        Err(errors) => return Ok(login_page(&actor, login, next, errors)),
    };
    match state.accounts.authenticate(&credentials).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "User logged in");
            start_session(&state, &user, next)
        }
        Err(DomainError::Validation(errors)) => Ok(login_page(&actor, login, next, errors)),
        Err(e) => Err(e.into()),
    }
}

/// GET or POST /accounts/logout/
pub async fn logout() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(cleared_session_cookie())
        .finish()
}

/// GET /upgrade/
pub async fn upgrade(state: web::Data<AppState>, actor: CurrentActor) -> AppResult<HttpResponse> {
    state.accounts.upgrade(actor.get()).await?;
    Ok(redirect("/"))
}
