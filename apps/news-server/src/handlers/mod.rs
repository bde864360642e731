//! HTTP handlers and route configuration.

mod accounts;
mod categories;
mod comments;
mod errors;
mod health;
mod posts;

#[cfg(test)]
mod tests;

use actix_web::{HttpRequest, HttpResponse, http::header, web};

pub use errors::{not_found, path_error};

/// Form or query pairs in submission order; repeated keys are kept.
pub type Pairs = Vec<(String, String)>;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::list))
        .route("/search/", web::get().to(posts::search))
        .service(
            web::resource("/add/")
                .route(web::get().to(posts::add_form))
                .route(web::post().to(posts::add)),
        )
        .route("/upgrade/", web::get().to(accounts::upgrade))
        .service(web::resource("/add_category/").route(web::post().to(categories::add)))
        .service(
            web::resource("/subscribe/{category_id}/")
                .route(web::post().to(categories::subscribe)),
        )
        .service(
            web::resource("/unsubscribe/{category_id}/")
                .route(web::post().to(categories::unsubscribe)),
        )
        .service(
            web::resource("/delete_comment/{id}/").route(web::post().to(comments::delete)),
        )
        .route("/health/", web::get().to(health::health_check))
        .service(
            web::scope("/accounts")
                .service(
                    web::resource("/signup/")
                        .route(web::get().to(accounts::signup_form))
                        .route(web::post().to(accounts::signup)),
                )
                .service(
                    web::resource("/login/")
                        .route(web::get().to(accounts::login_form))
                        .route(web::post().to(accounts::login)),
                )
                .service(
                    web::resource("/logout/")
                        .route(web::get().to(accounts::logout))
                        .route(web::post().to(accounts::logout)),
                ),
        )
        .route(r"/{id:\d+}/", web::get().to(posts::detail))
        .service(
            web::resource(r"/{id:\d+}/edit/")
                .route(web::get().to(posts::edit_form))
                .route(web::post().to(posts::edit)),
        )
        .service(web::resource(r"/{id:\d+}/delete/").route(web::post().to(posts::delete)))
        .service(
            web::resource(r"/{id:\d+}/add_comment/").route(web::post().to(comments::add)),
        );
}

/// 302 to `location`.
pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// The `Referer`, unless it points back at this very URL.
pub(crate) fn referer_or(req: &HttpRequest, fallback: &str) -> String {
    let conn = req.connection_info();
    let current = format!("{}://{}{}", conn.scheme(), conn.host(), req.uri());
    req.headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .filter(|r| !r.is_empty() && *r != current)
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}
