//! SeaORM entities for the portal schema.

pub mod author;
pub mod category;
pub mod category_subscriber;
pub mod comment;
pub mod group;
pub mod post;
pub mod post_category;
pub mod user;
pub mod user_group;
pub mod user_permission;
