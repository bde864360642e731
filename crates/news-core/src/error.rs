//! Domain-level error types.

use thiserror::Error;

use crate::forms::FormErrors;

/// Domain errors - business logic failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity_type} with id {id} not found")]
    NotFound { entity_type: &'static str, id: i32 },

    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Validation failed: {0}")]
    Validation(FormErrors),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error(
        "Daily post limit exceeded.\n\
         Try publishing your post tomorrow or delete one of your three latest posts.\n\
         \n\
         Here are the title and text of your post:\n\
         Title: {title}\n\
         Text:\n\
         {text}"
    )]
    DailyLimitExceeded { title: String, text: String },

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl DomainError {
    pub fn not_found(entity_type: &'static str, id: i32) -> Self {
        DomainError::NotFound { entity_type, id }
    }
}

/// Repository-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
