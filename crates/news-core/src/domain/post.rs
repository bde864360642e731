use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Article,
    News,
}

impl PostType {
    pub const ALL: [PostType; 2] = [PostType::Article, PostType::News];

    /// Stable value used in storage, forms and query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            PostType::Article => "article",
            PostType::News => "news",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PostType::Article => "Article",
            PostType::News => "News",
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "article" => Ok(PostType::Article),
            "news" => Ok(PostType::News),
            other => Err(format!("unknown post type: {}", other)),
        }
    }
}

/// Post entity - an article or news item written by an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    pub post_type: PostType,
    pub title: String,
    pub text: String,
    pub author_id: i32,
    pub publish_time: DateTime<Utc>,
}

impl Post {
    pub fn url(&self) -> String {
        format!("/{}/", self.id)
    }

    /// First `limit` characters of the text, for listings and emails.
    pub fn preview(&self, limit: usize) -> String {
        let mut chars = self.text.chars();
        let head: String = chars.by_ref().take(limit).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

/// Data required to insert a new [`Post`].
#[derive(Debug, Clone)]
pub struct NewPost {
    pub post_type: PostType,
    pub title: String,
    pub text: String,
    pub author_id: i32,
    pub publish_time: DateTime<Utc>,
    /// Categories linked in the same write as the post.
    pub category_ids: Vec<i32>,
}

/// Editable fields of an existing [`Post`].
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub post_type: PostType,
    pub title: String,
    pub text: String,
    /// The complete new category set.
    pub category_ids: Vec<i32>,
}
