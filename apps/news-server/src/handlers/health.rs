//! Health check endpoint.

use actix_web::{HttpResponse, web};

use news_shared::HealthResponse;

use crate::state::AppState;

/// Liveness probe, reporting which store backs the server.
///
/// GET /health/
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    HttpResponse::Ok()
        .insert_header((
            "X-Store",
            if state.db.is_some() { "postgres" } else { "memory" },
        ))
        .json(response)
}
