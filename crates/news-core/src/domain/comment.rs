use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity - a user's remark on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub text: String,
    pub publish_time: DateTime<Utc>,
}

impl Comment {
    pub fn delete_url(&self) -> String {
        format!("/delete_comment/{}/", self.id)
    }
}

/// Data required to insert a new [`Comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i32,
    pub user_id: i32,
    pub text: String,
    pub publish_time: DateTime<Utc>,
}
