//! PostgreSQL repository implementations.

mod category;
mod comment;
mod post;
mod user;

use sea_orm::{DbErr, SqlErr};

use news_core::error::RepoError;

pub use category::PostgresCategoryRepository;
pub use comment::PostgresCommentRepository;
pub use post::PostgresPostRepository;
pub use user::{PostgresAuthorRepository, PostgresGroupRepository, PostgresUserRepository};

/// Unique and foreign key violations become [`RepoError::Constraint`].
pub(crate) fn query_err(e: DbErr) -> RepoError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => RepoError::Constraint(msg),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => RepoError::Constraint(msg),
        _ => RepoError::Query(e.to_string()),
    }
}

/// `%needle%` with LIKE wildcards in the needle escaped.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
