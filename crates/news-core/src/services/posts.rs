use std::sync::Arc;

use crate::DAILY_POST_LIMIT;
use crate::clock::SiteClock;
use crate::domain::{Category, NewPost, Post, PostChanges};
use crate::error::DomainError;
use crate::filter::PostFilter;
use crate::forms::{FormErrors, PostDraft, PostForm};
use crate::notify::CategoryNotice;
use crate::pagination::{Page, PageRequest};
use crate::policy::{self, Action, Actor};
use crate::ports::{
    AuthorRepository, CategoryRepository, CommentRepository, Notifier, PostRepository,
    UserRepository,
};
use crate::services::comments::{self, CommentView};

/// A post with what listings display next to it.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub author_name: String,
    pub categories: Vec<Category>,
}

/// A post with its comments.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub view: PostView,
    pub comments: Vec<CommentView>,
}

/// Post listing, search and authoring.
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    authors: Arc<dyn AuthorRepository>,
    users: Arc<dyn UserRepository>,
    categories: Arc<dyn CategoryRepository>,
    comments: Arc<dyn CommentRepository>,
    notifier: Arc<dyn Notifier>,
    clock: SiteClock,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        authors: Arc<dyn AuthorRepository>,
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
        comments: Arc<dyn CommentRepository>,
        notifier: Arc<dyn Notifier>,
        clock: SiteClock,
    ) -> Self {
        Self {
            posts,
            authors,
            users,
            categories,
            comments,
            notifier,
            clock,
        }
    }

    /// All posts, newest first.
    pub async fn list(&self, page: PageRequest) -> Result<Page<PostView>, DomainError> {
        self.search(&PostFilter::all(), page).await
    }

    pub async fn search(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<PostView>, DomainError> {
        let total = self.posts.count(filter).await?;
        page.check(total)?;
        let posts = self
            .posts
            .fetch(filter, page.offset(), page.per_page)
            .await?;

        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            views.push(self.view(post).await?);
        }
        Ok(Page::new(views, page, total))
    }

    pub async fn get(&self, id: i32) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    pub async fn detail(&self, id: i32) -> Result<PostDetail, DomainError> {
        let view = self.view(self.get(id).await?).await?;
        let mut comments = Vec::new();
        for comment in self.comments.for_post(id).await? {
            comments.push(comments::view(self.users.as_ref(), comment).await?);
        }
        Ok(PostDetail { view, comments })
    }

    /// Category choices for the post form.
    pub async fn category_choices(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self.categories.list().await?)
    }

    /// The post as an edit form, if the actor may edit it.
    pub async fn edit_draft(
        &self,
        actor: Option<&Actor>,
        id: i32,
    ) -> Result<PostDraft, DomainError> {
        let post = self.get(id).await?;
        policy::authorize(actor, Action::EditPost(&post))?;
        let category_ids = self.posts.category_ids(id).await?;
        Ok(PostDraft::from_post(&post, &category_ids))
    }

    /// Publish a post as the actor's author record.
    pub async fn create(
        &self,
        actor: Option<&Actor>,
        draft: &PostDraft,
    ) -> Result<Post, DomainError> {
        policy::authorize(actor, Action::CreatePost)?;
        let Some(actor) = actor else {
            return Err(DomainError::Unauthenticated);
        };
        let form = self.validate(draft).await?;
        let author = actor
            .author
            .ok_or_else(|| DomainError::not_found("Author", actor.id()))?;

        let new_post = NewPost {
            post_type: form.post_type,
            title: form.title,
            text: form.text,
            author_id: author.id,
            publish_time: self.clock.now(),
            category_ids: form.category_ids,
        };
        let (title, text) = (new_post.title.clone(), new_post.text.clone());
        let category_ids = new_post.category_ids.clone();
        let post = self
            .posts
            .create_within_limit(new_post, self.clock.today(), DAILY_POST_LIMIT)
            .await?
            .ok_or_else(|| {
                tracing::warn!(author_id = author.id, "Daily post limit reached");
                DomainError::DailyLimitExceeded { title, text }
            })?;

        self.notify_subscribers(&post, &category_ids).await;

        tracing::info!(post_id = post.id, author_id = author.id, "Post published");
        Ok(post)
    }

    /// Save the actor's edits. Only categories new to the post trigger
    /// notifications.
    pub async fn update(
        &self,
        actor: Option<&Actor>,
        id: i32,
        draft: &PostDraft,
    ) -> Result<Post, DomainError> {
        let post = self.get(id).await?;
        policy::authorize(actor, Action::EditPost(&post))?;
        let form = self.validate(draft).await?;

        let published = self
            .posts
            .count_published(post.author_id, self.clock.today())
            .await?;
        if published >= DAILY_POST_LIMIT {
            tracing::warn!(author_id = post.author_id, "Daily post limit reached");
            return Err(DomainError::DailyLimitExceeded {
                title: form.title,
                text: form.text,
            });
        }

        let (post, diff) = self
            .posts
            .update(
                id,
                PostChanges {
                    post_type: form.post_type,
                    title: form.title,
                    text: form.text,
                    category_ids: form.category_ids,
                },
            )
            .await?;
        self.notify_subscribers(&post, &diff.added).await;

        tracing::info!(post_id = id, "Post updated");
        Ok(post)
    }

    pub async fn delete(&self, actor: Option<&Actor>, id: i32) -> Result<(), DomainError> {
        let post = self.get(id).await?;
        policy::authorize(actor, Action::DeletePost(&post))?;
        self.posts.delete(id).await?;
        tracing::info!(post_id = id, "Post deleted");
        Ok(())
    }

    async fn validate(&self, draft: &PostDraft) -> Result<PostForm, DomainError> {
        let mut errors = FormErrors::new();
        let form = match draft.validate() {
            Ok(form) => Some(form),
            Err(e) => {
                errors = e;
                None
            }
        };

        if let Some(form) = &form {
            let known: Vec<i32> = self.categories.list().await?.iter().map(|c| c.id).collect();
            for id in &form.category_ids {
                if !known.contains(id) {
                    errors.add(
                        "category",
                        format!(
                            "Select a valid choice. {} is not one of the available choices.",
                            id
                        ),
                    );
                }
            }
        }

        match form {
            Some(form) if errors.is_empty() => Ok(form),
            _ => Err(DomainError::Validation(errors)),
        }
    }

    /// One notice per newly added category. Delivery failures are logged and
    /// never fail the request.
    async fn notify_subscribers(&self, post: &Post, added: &[i32]) {
        for &category_id in added {
            let category = match self.categories.find_by_id(category_id).await {
                Ok(Some(category)) => category,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(category_id, error = %e, "Could not load category");
                    continue;
                }
            };
            let recipients = match self.categories.subscribers(category_id).await {
                Ok(recipients) => recipients,
                Err(e) => {
                    tracing::warn!(category_id, error = %e, "Could not load subscribers");
                    continue;
                }
            };

            tracing::debug!(
                post_id = post.id,
                category_id,
                recipients = recipients.len(),
                "Notifying subscribers"
            );
            let notice = CategoryNotice {
                category,
                post: post.clone(),
                recipients,
            };
            if let Err(e) = self.notifier.notify(notice).await {
                tracing::warn!(post_id = post.id, category_id, error = %e, "Notification failed");
            }
        }
    }

    async fn view(&self, post: Post) -> Result<PostView, DomainError> {
        let author_name = match self.authors.find_by_id(post.author_id).await? {
            Some(author) => self
                .users
                .find_by_id(author.user_id)
                .await?
                .map(|u| u.username),
            None => None,
        }
        .unwrap_or_else(|| {
            tracing::warn!(post_id = post.id, "Post without a resolvable author");
            String::from("unknown")
        });
        let categories = self.categories.for_post(post.id).await?;
        Ok(PostView {
            post,
            author_name,
            categories,
        })
    }
}
