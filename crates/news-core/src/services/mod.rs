//! Application services - the operations request handlers invoke.
//!
//! Side effects that hang off persistence (the daily post limit, subscriber
//! notification) are explicit calls here rather than storage hooks.

mod accounts;
mod categories;
mod comments;
mod posts;

pub use accounts::AccountService;
pub use categories::CategoryService;
pub use comments::{CommentService, CommentView};
pub use posts::{PostDetail, PostService, PostView};
