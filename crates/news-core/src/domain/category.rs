use serde::{Deserialize, Serialize};

/// Category entity - a tag on posts with its own subscriber list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

impl Category {
    pub fn subscribe_url(&self) -> String {
        format!("/subscribe/{}/", self.id)
    }

    pub fn unsubscribe_url(&self) -> String {
        format!("/unsubscribe/{}/", self.id)
    }
}
