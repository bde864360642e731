//! # News Core
//!
//! The domain layer of the news portal.
//! Entities, ports, authorization policy, form validation, search filtering
//! and the services that tie them together. No infrastructure dependencies.

pub mod clock;
pub mod domain;
pub mod error;
pub mod filter;
pub mod forms;
pub mod notify;
pub mod pagination;
pub mod policy;
pub mod ports;
pub mod services;

pub use clock::{DayWindow, SiteClock};
pub use error::{DomainError, RepoError};
pub use policy::{Action, Actor};

/// Maximum number of posts an author may publish per calendar day.
pub const DAILY_POST_LIMIT: u64 = 3;

/// Posts per page on the front page.
pub const LIST_PAGE_SIZE: u64 = 10;

/// Posts per page on the search page.
pub const SEARCH_PAGE_SIZE: u64 = 4;
