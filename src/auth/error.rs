//! Auth error types

use thiserror::Error;

use crate::storage::StorageError;

/// Errors from registration, login and token checks
#[derive(Error, Debug)]
pub enum AuthError {
    /// Request body failed validation
    #[error("{0}")]
    InvalidInput(String),

    #[error("User already exists")]
    EmailTaken,

    /// Unknown email or wrong password; the two are not distinguished
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Auth task failed: {0}")]
    Task(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Failures caused by the caller rather than the server
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            AuthError::Hash(_) | AuthError::Signing(_) | AuthError::Task(_) | AuthError::Storage(_)
        )
    }
}

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;
