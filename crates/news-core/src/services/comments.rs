use std::sync::Arc;

use crate::clock::SiteClock;
use crate::domain::{Comment, NewComment};
use crate::error::DomainError;
use crate::forms::CommentForm;
use crate::policy::{self, Action, Actor};
use crate::ports::{CommentRepository, PostRepository, UserRepository};

/// A comment with its author's username.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub comment: Comment,
    pub username: String,
}

pub(crate) async fn view(
    users: &dyn UserRepository,
    comment: Comment,
) -> Result<CommentView, DomainError> {
    let username = users
        .find_by_id(comment.user_id)
        .await?
        .map(|u| u.username)
        .unwrap_or_default();
    Ok(CommentView { comment, username })
}

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
    clock: SiteClock,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        posts: Arc<dyn PostRepository>,
        clock: SiteClock,
    ) -> Self {
        Self {
            comments,
            posts,
            clock,
        }
    }

    /// Comment on a post. An invalid form is a [`DomainError::Validation`].
    pub async fn add(
        &self,
        actor: Option<&Actor>,
        post_id: i32,
        pairs: &[(String, String)],
    ) -> Result<CommentView, DomainError> {
        policy::authorize(actor, Action::Comment)?;
        let Some(actor) = actor else {
            return Err(DomainError::Unauthenticated);
        };
        if self.posts.find_by_id(post_id).await?.is_none() {
            return Err(DomainError::not_found("Post", post_id));
        }
        let form = CommentForm::parse(pairs).map_err(DomainError::Validation)?;

        let comment = self
            .comments
            .create(NewComment {
                post_id,
                user_id: actor.id(),
                text: form.text,
                publish_time: self.clock.now(),
            })
            .await?;
        tracing::info!(comment_id = comment.id, post_id, "Comment added");

        Ok(CommentView {
            comment,
            username: actor.user.username.clone(),
        })
    }

    /// Delete a comment. Only its author may.
    pub async fn delete(&self, actor: Option<&Actor>, id: i32) -> Result<(), DomainError> {
        if actor.is_none() {
            return Err(DomainError::Unauthenticated);
        }
        let comment = self
            .comments
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Comment", id))?;
        policy::authorize(actor, Action::DeleteComment(&comment))?;
        self.comments.delete(id).await?;
        tracing::info!(comment_id = id, "Comment deleted");
        Ok(())
    }

    /// Display form of a comment's publish time.
    pub fn format_time(&self, comment: &Comment) -> String {
        self.clock.format(comment.publish_time)
    }
}
