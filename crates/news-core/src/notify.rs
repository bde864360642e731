//! Subscriber notifications for newly tagged posts.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{Category, Post, User};

/// A post was tagged with a category; its subscribers should hear about it.
#[derive(Debug, Clone)]
pub struct CategoryNotice {
    pub category: Category,
    pub post: Post,
    pub recipients: Vec<User>,
}

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl CategoryNotice {
    /// One email per recipient. `site_url` prefixes the post link.
    pub fn emails(&self, from: &str, site_url: &str) -> Vec<Email> {
        let link = format!("{}{}", site_url.trim_end_matches('/'), self.post.url());
        self.recipients
            .iter()
            .map(|user| Email {
                from: from.to_string(),
                to: user.email.clone(),
                subject: self.post.title.clone(),
                body: format!(
                    "Hello, {}. A new post in your favourite category \"{}\"!\n\n\
                     {}\n{}\n\n\
                     Read it here: {}",
                    user.username,
                    self.category.name,
                    self.post.title,
                    self.post.preview(50),
                    link
                ),
            })
            .collect()
    }
}

/// Delivers category notices.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: CategoryNotice) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Failed to deliver notification: {0}")]
    Delivery(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostType;
    use chrono::Utc;

    #[test]
    fn test_one_email_per_recipient() {
        let recipient = |id: i32, name: &str| User {
            id,
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: String::new(),
            joined_at: Utc::now(),
        };
        let notice = CategoryNotice {
            category: Category {
                id: 2,
                name: "Science".to_string(),
            },
            post: Post {
                id: 42,
                post_type: PostType::News,
                title: "Comet spotted".to_string(),
                text: "A bright comet is visible tonight.".to_string(),
                author_id: 1,
                publish_time: Utc::now(),
            },
            recipients: vec![recipient(1, "ann"), recipient(2, "ben")],
        };

        let emails = notice.emails("news@example.com", "https://news.example.com/");
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[1].to, "ben@example.com");
        assert_eq!(emails[0].subject, "Comet spotted");
        assert!(emails[0].body.contains("Hello, ann."));
        assert!(emails[0].body.contains("\"Science\""));
        assert!(emails[0].body.ends_with("https://news.example.com/42/"));
    }
}
