//! # News Shared
//!
//! Payload types of the JSON endpoints. The page scripts toggling
//! subscriptions and posting comments read exactly these shapes.

pub mod response;

pub use response::{
    CommentCreated, CommentDeleted, CommentRejected, HealthResponse, SubscriptionToggled,
};
