//! In-memory store - used as fallback when no database is configured.
//!
//! Implements every repository port over one set of tables behind a single
//! async lock, so multi-step operations such as the daily-limit check are
//! atomic. Data is lost on process restart.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use news_core::clock::DayWindow;
use news_core::domain::{
    Author, Category, Comment, NewComment, NewPost, NewUser, Permission, Post, PostChanges, Role,
    User,
};
use news_core::error::RepoError;
use news_core::filter::PostFilter;
use news_core::ports::{
    AuthorRepository, CategoryDiff, CategoryRepository, CommentRepository, GroupRepository,
    PostRepository, UserRepository,
};

#[cfg(test)]
mod tests;

#[derive(Default)]
struct Sequence(i32);

impl Sequence {
    fn next(&mut self) -> i32 {
        self.0 += 1;
        self.0
    }
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    groups: BTreeMap<i32, String>,
    /// (user_id, group_id)
    memberships: BTreeSet<(i32, i32)>,
    grants: BTreeSet<(i32, Permission)>,
    authors: BTreeMap<i32, Author>,
    categories: BTreeMap<i32, Category>,
    /// (category_id, user_id)
    subscriptions: BTreeSet<(i32, i32)>,
    posts: BTreeMap<i32, Post>,
    /// (post_id, category_id)
    post_categories: BTreeSet<(i32, i32)>,
    comments: BTreeMap<i32, Comment>,

    user_ids: Sequence,
    author_ids: Sequence,
    category_ids: Sequence,
    post_ids: Sequence,
    comment_ids: Sequence,
}

impl Tables {
    fn author_username(&self, author_id: i32) -> &str {
        self.authors
            .get(&author_id)
            .and_then(|a| self.users.get(&a.user_id))
            .map(|u| u.username.as_str())
            .unwrap_or("")
    }

    fn categories_of(&self, post_id: i32) -> Vec<i32> {
        self.post_categories
            .range((post_id, i32::MIN)..=(post_id, i32::MAX))
            .map(|&(_, c)| c)
            .collect()
    }

    fn matching(&self, filter: &PostFilter) -> Vec<Post> {
        self.posts
            .values()
            .filter(|p| {
                filter.matches(
                    p,
                    self.author_username(p.author_id),
                    &self.categories_of(p.id),
                )
            })
            .cloned()
            .collect()
    }

    /// Unknown ids fail like a foreign key would, before anything is written.
    fn check_categories(&self, category_ids: &[i32]) -> Result<(), RepoError> {
        match category_ids
            .iter()
            .find(|id| !self.categories.contains_key(*id))
        {
            Some(id) => Err(RepoError::Constraint(format!("no category {}", id))),
            None => Ok(()),
        }
    }

    fn link_categories(&mut self, post_id: i32, wanted: &[i32]) -> CategoryDiff {
        let current: BTreeSet<i32> = self.categories_of(post_id).into_iter().collect();
        let wanted: BTreeSet<i32> = wanted.iter().copied().collect();

        let diff = CategoryDiff {
            added: wanted.difference(&current).copied().collect(),
            removed: current.difference(&wanted).copied().collect(),
        };
        for category_id in &diff.removed {
            self.post_categories.remove(&(post_id, *category_id));
        }
        for category_id in &diff.added {
            self.post_categories.insert((post_id, *category_id));
        }
        diff
    }

    fn published_in(&self, author_id: i32, window: DayWindow) -> u64 {
        self.posts
            .values()
            .filter(|p| p.author_id == author_id && window.contains(p.publish_time))
            .count() as u64
    }
}

/// Every repository port over process memory.
///
/// The "common" and "authors" groups exist from the start.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let mut tables = Tables::default();
        for (id, role) in (1..).zip(Role::ALL) {
            tables.groups.insert(id, role.group_name().to_string());
        }
        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == new_user.username) {
            return Err(RepoError::Constraint(format!(
                "username {} is taken",
                new_user.username
            )));
        }
        let user = User {
            id: tables.user_ids.next(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            joined_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn group_ids(&self, user_id: i32) -> Result<Vec<i32>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .range((user_id, i32::MIN)..=(user_id, i32::MAX))
            .map(|&(_, g)| g)
            .collect())
    }

    async fn add_to_group(&self, user_id: i32, group_id: i32) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.groups.contains_key(&group_id) {
            return Err(RepoError::Constraint(format!("no group {}", group_id)));
        }
        tables.memberships.insert((user_id, group_id));
        Ok(())
    }

    async fn grants(&self, user_id: i32) -> Result<Vec<Permission>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .grants
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|&(_, p)| p)
            .collect())
    }

    async fn grant(&self, user_id: i32, permission: Permission) -> Result<(), RepoError> {
        self.tables
            .write()
            .await
            .grants
            .insert((user_id, permission));
        Ok(())
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<i32>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(&id, _)| id))
    }
}

#[async_trait]
impl AuthorRepository for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Author>, RepoError> {
        Ok(self.tables.read().await.authors.get(&id).copied())
    }

    async fn find_by_user(&self, user_id: i32) -> Result<Option<Author>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .authors
            .values()
            .find(|a| a.user_id == user_id)
            .copied())
    }

    async fn create(&self, user_id: i32) -> Result<Author, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.authors.values().any(|a| a.user_id == user_id) {
            return Err(RepoError::Constraint(format!(
                "user {} already has an author record",
                user_id
            )));
        }
        let author = Author {
            id: tables.author_ids.next(),
            user_id,
        };
        tables.authors.insert(author.id, author);
        Ok(author)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Category>, RepoError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create(&self, name: &str) -> Result<Category, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.categories.values().any(|c| c.name == name) {
            return Err(RepoError::Constraint(format!("category {} exists", name)));
        }
        let category = Category {
            id: tables.category_ids.next(),
            name: name.to_string(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn for_post(&self, post_id: i32) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables
            .categories_of(post_id)
            .iter()
            .filter_map(|id| tables.categories.get(id).cloned())
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn add_subscriber(&self, category_id: i32, user_id: i32) -> Result<(), RepoError> {
        self.tables
            .write()
            .await
            .subscriptions
            .insert((category_id, user_id));
        Ok(())
    }

    async fn remove_subscriber(&self, category_id: i32, user_id: i32) -> Result<(), RepoError> {
        self.tables
            .write()
            .await
            .subscriptions
            .remove(&(category_id, user_id));
        Ok(())
    }

    async fn subscribers(&self, category_id: i32) -> Result<Vec<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .range((category_id, i32::MIN)..=(category_id, i32::MAX))
            .filter_map(|(_, u)| tables.users.get(u).cloned())
            .collect())
    }

    async fn subscribed_ids(&self, user_id: i32) -> Result<Vec<i32>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|(_, u)| *u == user_id)
            .map(|&(c, _)| c)
            .collect())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        Ok(self.tables.read().await.matching(filter).len() as u64)
    }

    async fn fetch(
        &self,
        filter: &PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        let mut posts = self.tables.read().await.matching(filter);
        filter.sort(&mut posts);
        Ok(posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count_published(&self, author_id: i32, window: DayWindow) -> Result<u64, RepoError> {
        Ok(self.tables.read().await.published_in(author_id, window))
    }

    async fn create_within_limit(
        &self,
        new_post: NewPost,
        window: DayWindow,
        limit: u64,
    ) -> Result<Option<Post>, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.authors.contains_key(&new_post.author_id) {
            return Err(RepoError::Constraint(format!(
                "no author {}",
                new_post.author_id
            )));
        }
        if tables.published_in(new_post.author_id, window) >= limit {
            return Ok(None);
        }
        tables.check_categories(&new_post.category_ids)?;
        let post = Post {
            id: tables.post_ids.next(),
            post_type: new_post.post_type,
            title: new_post.title,
            text: new_post.text,
            author_id: new_post.author_id,
            publish_time: new_post.publish_time,
        };
        tables.posts.insert(post.id, post.clone());
        tables.link_categories(post.id, &new_post.category_ids);
        Ok(Some(post))
    }

    async fn update(
        &self,
        id: i32,
        changes: PostChanges,
    ) -> Result<(Post, CategoryDiff), RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&id) {
            return Err(RepoError::NotFound);
        }
        tables.check_categories(&changes.category_ids)?;

        let diff = tables.link_categories(id, &changes.category_ids);
        let post = tables.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        post.post_type = changes.post_type;
        post.title = changes.title;
        post.text = changes.text;
        Ok((post.clone(), diff))
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        tables.post_categories.retain(|&(p, _)| p != id);
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(())
    }

    async fn category_ids(&self, post_id: i32) -> Result<Vec<i32>, RepoError> {
        Ok(self.tables.read().await.categories_of(post_id))
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn for_post(&self, post_id: i32) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.publish_time, c.id));
        Ok(comments)
    }

    async fn create(&self, new_comment: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&new_comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "no post {}",
                new_comment.post_id
            )));
        }
        let comment = Comment {
            id: tables.comment_ids.next(),
            post_id: new_comment.post_id,
            user_id: new_comment.user_id,
            text: new_comment.text,
            publish_time: new_comment.publish_time,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        match self.tables.write().await.comments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}
