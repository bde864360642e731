//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod repository;

pub use crate::notify::{Notifier, NotifyError};
pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use repository::{
    AuthorRepository, CategoryDiff, CategoryRepository, CommentRepository, GroupRepository,
    PostRepository, UserRepository,
};
