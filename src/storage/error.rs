//! Storage error types
//!
//! Defines all errors that can occur in the storage layer.

use thiserror::Error;

/// Errors that can occur in the event store
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite reported a failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O operation failed (creating the database directory, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection mutex was poisoned by a panicking holder
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::Lock("poisoned".to_string());
        assert_eq!(err.to_string(), "Lock error: poisoned");
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StorageError::Database(_)));
    }
}
