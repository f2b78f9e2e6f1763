//! Request guards
//!
//! - **rate_limit**: per-IP fixed-window budget on `/api/v1`
//! - **auth**: `AuthUser` extractor for bearer tokens

pub mod auth;
pub mod rate_limit;

pub use auth::AuthUser;
pub use rate_limit::{rate_limit, RateLimiter};
