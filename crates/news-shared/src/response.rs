//! JSON response bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A comment was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentCreated {
    pub success: bool,
    pub comment_id: i32,
    pub comment_text: String,
    /// `DD.MM.YYYY HH:MM:SS` in the site timezone.
    pub comment_publish_time: String,
    pub comment_user: String,
    pub comment_delete_url: String,
}

/// The comment form did not validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRejected {
    pub success: bool,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl CommentRejected {
    pub fn new(errors: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            success: false,
            errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDeleted {
    pub deleted: bool,
}

/// Subscription changed; `url` performs the opposite action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionToggled {
    pub success: bool,
    pub url: String,
}

impl SubscriptionToggled {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            success: true,
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}
