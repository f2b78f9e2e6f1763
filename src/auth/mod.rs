//! Accounts and session tokens
//!
//! - **service**: register / login / me over a [`UserRepository`]
//! - **password**: argon2 hashing
//! - **token**: HS256 JWT issue and verify
//!
//! [`UserRepository`]: crate::storage::UserRepository

mod error;
pub mod password;
mod service;
pub mod token;

pub use error::{AuthError, AuthResult};
pub use service::{AuthResponse, AuthService, LoginRequest, RegisterRequest, UserProfile};
pub use token::{Claims, TokenIssuer};
