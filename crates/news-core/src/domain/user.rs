use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity - an account that can log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub joined_at: DateTime<Utc>,
}

/// Data required to insert a new [`User`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}
