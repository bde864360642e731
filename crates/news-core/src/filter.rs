//! Search criteria for posts.

use chrono::{DateTime, NaiveDate, Utc};

use crate::clock::SiteClock;
use crate::domain::{Post, PostType};

/// Query parameters understood by [`PostFilter`].
pub const FILTER_FIELDS: [&str; 6] = [
    "title",
    "author",
    "category",
    "type",
    "published_after",
    "ordering",
];

/// Result ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostOrdering {
    #[default]
    Newest,
    Oldest,
    TitleAsc,
    TitleDesc,
}

impl PostOrdering {
    /// Parameter values with their labels, for select boxes.
    pub const CHOICES: [(&'static str, &'static str); 4] = [
        ("-publish_time", "Newest first"),
        ("publish_time", "Oldest first"),
        ("title", "Title (A-Z)"),
        ("-title", "Title (Z-A)"),
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "-publish_time" => Some(PostOrdering::Newest),
            "publish_time" => Some(PostOrdering::Oldest),
            "title" => Some(PostOrdering::TitleAsc),
            "-title" => Some(PostOrdering::TitleDesc),
            _ => None,
        }
    }
}

/// Filtered view over all posts.
///
/// Blank and malformed values are dropped rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Case-insensitive substring of the author's username.
    pub author: Option<String>,
    pub category: Option<i32>,
    pub post_type: Option<PostType>,
    /// Posts published at or after this instant.
    pub published_since: Option<DateTime<Utc>>,
    pub ordering: PostOrdering,
}

impl PostFilter {
    /// Every post, newest first.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(String, String)], clock: &SiteClock) -> Self {
        let mut filter = Self::default();
        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "title" => filter.title = Some(value.to_lowercase()),
                "author" => filter.author = Some(value.to_lowercase()),
                "category" => {
                    if let Ok(id) = value.parse() {
                        filter.category = Some(id);
                    }
                }
                "type" => {
                    if let Ok(t) = value.parse() {
                        filter.post_type = Some(t);
                    }
                }
                "published_after" => {
                    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                        filter.published_since = Some(clock.start_of(date));
                    }
                }
                "ordering" => {
                    if let Some(ordering) = PostOrdering::parse(value) {
                        filter.ordering = ordering;
                    }
                }
                _ => {}
            }
        }
        filter
    }

    /// In-process evaluation, used by stores without a query language.
    pub fn matches(&self, post: &Post, author_username: &str, category_ids: &[i32]) -> bool {
        if let Some(title) = &self.title {
            if !post.title.to_lowercase().contains(title) {
                return false;
            }
        }
        if let Some(author) = &self.author {
            if !author_username.to_lowercase().contains(author) {
                return false;
            }
        }
        if let Some(category) = self.category {
            if !category_ids.contains(&category) {
                return false;
            }
        }
        if let Some(post_type) = self.post_type {
            if post.post_type != post_type {
                return false;
            }
        }
        if let Some(since) = self.published_since {
            if post.publish_time < since {
                return false;
            }
        }
        true
    }

    /// Sort posts in place by this filter's ordering. Ties fall back to id.
    pub fn sort(&self, posts: &mut [Post]) {
        match self.ordering {
            PostOrdering::Newest => {
                posts.sort_by(|a, b| (b.publish_time, b.id).cmp(&(a.publish_time, a.id)))
            }
            PostOrdering::Oldest => {
                posts.sort_by(|a, b| (a.publish_time, a.id).cmp(&(b.publish_time, b.id)))
            }
            PostOrdering::TitleAsc => posts.sort_by(|a, b| (&a.title, a.id).cmp(&(&b.title, b.id))),
            PostOrdering::TitleDesc => {
                posts.sort_by(|a, b| (&b.title, b.id).cmp(&(&a.title, a.id)))
            }
        }
    }
}

/// The supplied filter parameters, url-encoded, for sticky forms and page links.
pub fn echo_params(pairs: &[(String, String)]) -> String {
    let kept: Vec<(&str, &str)> = pairs
        .iter()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    serde_urlencoded::to_string(kept).unwrap_or_default()
}
