//! Comment endpoints. Both answer with JSON for the post page script.

use actix_web::{HttpResponse, web};

use news_core::error::DomainError;
use news_shared::{CommentCreated, CommentDeleted, CommentRejected};

use super::Pairs;
use crate::middleware::auth::CurrentActor;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /{id}/add_comment/
pub async fn add(
    state: web::Data<AppState>,
    actor: CurrentActor,
    path: web::Path<i32>,
    form: web::Form<Pairs>,
) -> AppResult<HttpResponse> {
    match state
        .comments
        .add(actor.get(), path.into_inner(), &form.0)
        .await
    {
        Ok(view) => Ok(HttpResponse::Ok().json(CommentCreated {
            success: true,
            comment_id: view.comment.id,
            comment_text: view.comment.text.clone(),
            comment_publish_time: state.comments.format_time(&view.comment),
            comment_user: view.username,
            comment_delete_url: view.comment.delete_url(),
        })),
        Err(DomainError::Validation(errors)) => {
            Ok(HttpResponse::Ok().json(CommentRejected::new(errors.into_map())))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /delete_comment/{id}/
pub async fn delete(
    state: web::Data<AppState>,
    actor: CurrentActor,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    state.comments.delete(actor.get(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(CommentDeleted { deleted: true }))
}
