//! Error handling - domain failures rendered as HTML error pages.

use std::fmt;

use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{HttpResponse, ResponseError};

use news_core::error::{DomainError, RepoError};

use crate::pages::{ErrorPage, TemplateExt};

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(Vec<String>),
    /// Login required; turned into a redirect by [`error_handlers`].
    Unauthenticated,
    Forbidden(String),
    Conflict(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::BadRequest(messages) => write!(f, "{}", messages.join("\n")),
            AppError::Unauthenticated => write!(f, "Authentication required"),
            AppError::Forbidden(msg) => write!(f, "{}", msg),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::Internal(_) => write!(f, "Something went wrong on our side."),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(detail) = self {
            tracing::error!("Internal error: {}", detail);
        }
        ErrorPage::new(self.status_code(), &self.to_string()).to_response_with(self.status_code())
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { .. } | DomainError::InvalidPage(_) => {
                AppError::NotFound(err.to_string())
            }
            DomainError::Validation(errors) => AppError::BadRequest(
                errors.into_map().into_values().flatten().collect(),
            ),
            DomainError::Unauthenticated => AppError::Unauthenticated,
            DomainError::Forbidden(msg) => AppError::Forbidden(msg),
            DomainError::DailyLimitExceeded { .. } => {
                tracing::info!("Daily post limit reached");
                AppError::Forbidden(err.to_string())
            }
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
            DomainError::Repo(e) => e.into(),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Turns 401 responses into a redirect to the login page carrying `next`.
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().handler(StatusCode::UNAUTHORIZED, login_redirect)
}

fn login_redirect<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let next = res
        .request()
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let query = serde_urlencoded::to_string([("next", next.as_str())]).unwrap_or_default();

    let (req, _) = res.into_parts();
    let response = HttpResponse::Found()
        .insert_header((header::LOCATION, format!("/accounts/login/?{}", query)))
        .finish();

    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, response).map_into_right_body::<B>(),
    ))
}
