//! Query error types
//!
//! Defines all error conditions that can occur while normalizing a filter
//! and executing an analytics query.

use thiserror::Error;

/// Errors that can occur during query operations
#[derive(Error, Debug)]
pub enum QueryError {
    /// Date parameter is not an RFC 3339 date-time
    #[error("{field} must be an ISO-8601 date-time, got '{value}'")]
    InvalidDate { field: &'static str, value: String },

    /// Numeric parameter contains something other than digits
    #[error("{field} must be a non-negative integer, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    /// Numeric parameter is zero where at least 1 is required
    #[error("{field} must be at least 1")]
    NonPositive { field: &'static str },

    /// startDate lies after endDate
    #[error("Invalid time range: startDate must not be after endDate")]
    InvalidRange,

    /// Requested page size above the configured cap
    #[error("limit {limit} exceeds the maximum page size of {max}")]
    LimitTooLarge { limit: u32, max: u32 },

    /// Unknown chart interval
    #[error("{0}")]
    InvalidInterval(String),

    /// Record id is not a UUID
    #[error("Invalid id: {0}")]
    InvalidId(String),

    /// No record with the requested id
    #[error("Analytics record not found: {0}")]
    NotFound(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    /// Blocking query task failed to complete
    #[error("Execution error: {0}")]
    Execution(String),
}

impl QueryError {
    /// Whether this error was caused by malformed client input
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            QueryError::InvalidDate { .. }
                | QueryError::InvalidNumber { .. }
                | QueryError::NonPositive { .. }
                | QueryError::InvalidRange
                | QueryError::LimitTooLarge { .. }
                | QueryError::InvalidInterval(_)
                | QueryError::InvalidId(_)
        )
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QueryError::InvalidNumber {
            field: "page",
            value: "-1".to_string(),
        };
        assert_eq!(err.to_string(), "page must be a non-negative integer, got '-1'");

        let err = QueryError::LimitTooLarge {
            limit: 5000,
            max: 100,
        };
        assert_eq!(
            err.to_string(),
            "limit 5000 exceeds the maximum page size of 100"
        );
    }

    #[test]
    fn test_is_validation() {
        assert!(QueryError::InvalidRange.is_validation());
        assert!(QueryError::NonPositive { field: "limit" }.is_validation());
        assert!(!QueryError::NotFound("x".to_string()).is_validation());
        assert!(!QueryError::Execution("panicked".to_string()).is_validation());
    }
}
