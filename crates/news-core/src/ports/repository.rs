use async_trait::async_trait;

use crate::clock::DayWindow;
use crate::domain::{
    Author, Category, Comment, NewComment, NewPost, NewUser, Permission, Post, PostChanges, User,
};
use crate::error::RepoError;
use crate::filter::PostFilter;

/// User accounts, group membership and explicit permission grants.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Insert a user. A taken username is a [`RepoError::Constraint`].
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    /// Ids of the groups the user belongs to.
    async fn group_ids(&self, user_id: i32) -> Result<Vec<i32>, RepoError>;

    /// Add the user to a group. Adding twice is a no-op.
    async fn add_to_group(&self, user_id: i32, group_id: i32) -> Result<(), RepoError>;

    /// Permissions granted to the user directly, not through groups.
    async fn grants(&self, user_id: i32) -> Result<Vec<Permission>, RepoError>;

    /// Grant a permission directly. Granting twice is a no-op.
    async fn grant(&self, user_id: i32, permission: Permission) -> Result<(), RepoError>;
}

/// Named user groups.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<i32>, RepoError>;
}

#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Author>, RepoError>;

    async fn find_by_user(&self, user_id: i32) -> Result<Option<Author>, RepoError>;

    /// Create the author record of a user.
    async fn create(&self, user_id: i32) -> Result<Author, RepoError>;
}

/// Categories and their subscriber sets.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Category>, RepoError>;

    /// Every category, ordered by name.
    async fn list(&self) -> Result<Vec<Category>, RepoError>;

    /// Insert a category. A taken name is a [`RepoError::Constraint`].
    async fn create(&self, name: &str) -> Result<Category, RepoError>;

    /// Categories a post is tagged with, ordered by name.
    async fn for_post(&self, post_id: i32) -> Result<Vec<Category>, RepoError>;

    /// Add a subscriber. Adding twice is a no-op.
    async fn add_subscriber(&self, category_id: i32, user_id: i32) -> Result<(), RepoError>;

    /// Remove a subscriber. Removing a non-subscriber is a no-op.
    async fn remove_subscriber(&self, category_id: i32, user_id: i32) -> Result<(), RepoError>;

    async fn subscribers(&self, category_id: i32) -> Result<Vec<User>, RepoError>;

    /// Ids of the categories a user subscribes to.
    async fn subscribed_ids(&self, user_id: i32) -> Result<Vec<i32>, RepoError>;
}

/// Outcome of replacing a post's category set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDiff {
    pub added: Vec<i32>,
    pub removed: Vec<i32>,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Post>, RepoError>;

    /// Number of posts matching the filter.
    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError>;

    /// A slice of the posts matching the filter, in the filter's order.
    async fn fetch(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError>;

    /// Posts by `author_id` published inside `window`.
    async fn count_published(&self, author_id: i32, window: DayWindow) -> Result<u64, RepoError>;

    /// Insert a post and link its categories unless its author already
    /// published `limit` posts inside `window`. Counting, inserting and linking
    /// happen atomically; `None` means the limit was reached and nothing was
    /// written. An unknown category is a [`RepoError::Constraint`] and also
    /// leaves nothing behind.
    async fn create_within_limit(
        &self,
        post: NewPost,
        window: DayWindow,
        limit: u64,
    ) -> Result<Option<Post>, RepoError>;

    /// Save the fields and replace the category set in one write, reporting
    /// which categories changed.
    async fn update(
        &self,
        id: i32,
        changes: PostChanges,
    ) -> Result<(Post, CategoryDiff), RepoError>;

    async fn delete(&self, id: i32) -> Result<(), RepoError>;

    async fn category_ids(&self, post_id: i32) -> Result<Vec<i32>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<Comment>, RepoError>;

    /// Comments on a post, oldest first.
    async fn for_post(&self, post_id: i32) -> Result<Vec<Comment>, RepoError>;

    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError>;

    async fn delete(&self, id: i32) -> Result<(), RepoError>;
}
