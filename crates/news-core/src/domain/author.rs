use serde::{Deserialize, Serialize};

/// Author entity - a user with posting rights, one-to-one with [`super::User`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i32,
    pub user_id: i32,
}
