//! Domain entities - the core business objects.

mod author;
mod category;
mod comment;
mod post;
mod role;
mod user;

pub use author::Author;
pub use category::Category;
pub use comment::{Comment, NewComment};
pub use post::{NewPost, Post, PostChanges, PostType};
pub use role::{Permission, Role, RoleRegistry};
pub use user::{NewUser, User};
