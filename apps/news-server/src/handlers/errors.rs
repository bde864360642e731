//! Fallback responses for unmatched routes and malformed paths.

use actix_web::error::PathError;
use actix_web::{HttpRequest, HttpResponse};

use crate::middleware::error::AppError;

/// Default service: the 404 page.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    tracing::debug!(path = %req.path(), "No route matched");
    Err(AppError::NotFound(format!(
        "The requested resource {} was not found on this server.",
        req.path()
    )))
}

/// Path segments that do not parse are missing resources.
pub fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound(err.to_string()).into()
}
