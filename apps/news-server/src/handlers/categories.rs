//! Category creation and subscriptions.

use actix_web::{HttpRequest, HttpResponse, web};

use news_shared::SubscriptionToggled;

use super::{Pairs, redirect, referer_or};
use crate::middleware::auth::CurrentActor;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /add_category/
pub async fn add(
    req: HttpRequest,
    state: web::Data<AppState>,
    actor: CurrentActor,
    form: web::Form<Pairs>,
) -> AppResult<HttpResponse> {
    state.categories.create(actor.get(), &form.0).await?;
    Ok(redirect(&referer_or(&req, "/")))
}

/// POST /subscribe/{category_id}/
///
/// Answers with the URL that undoes the subscription.
pub async fn subscribe(
    state: web::Data<AppState>,
    actor: CurrentActor,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let category = state
        .categories
        .subscribe(actor.get(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SubscriptionToggled::new(category.unsubscribe_url())))
}

/// POST /unsubscribe/{category_id}/
pub async fn unsubscribe(
    state: web::Data<AppState>,
    actor: CurrentActor,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let category = state
        .categories
        .unsubscribe(actor.get(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(SubscriptionToggled::new(category.subscribe_url())))
}
