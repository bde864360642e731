//! # News Infrastructure
//!
//! Concrete implementations of the ports defined in `news-core`:
//! PostgreSQL repositories, an in-memory store, session tokens, password
//! hashing and subscriber notifiers.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory store only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `auth` - JWT + Argon2 authentication

pub mod database;
pub mod memory;
pub mod notify;

#[cfg(feature = "auth")]
pub mod auth;

pub use database::{DatabaseConfig, DatabaseConnections};
pub use memory::InMemoryStore;
pub use notify::{LogNotifier, WebhookNotifier};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
