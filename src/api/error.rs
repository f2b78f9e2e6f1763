//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.
//!
//! Server-side failures never leak their detail to the client: the body
//! carries a generic message and the `request_id` under which the real
//! error was logged.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthError;
use crate::query::QueryError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("{0}")]
    Validation(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Query normalization or execution error
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Registration, login or token failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Per-client request budget exhausted
    #[error("{0}")]
    RateLimited(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable (dependency down)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status and machine-readable code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Query(QueryError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Query(e) if e.is_validation() => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            ApiError::Auth(AuthError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            ApiError::Auth(AuthError::EmailTaken) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Auth(e) if e.is_client_error() => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Query(_)
            | ApiError::Auth(_)
            | ApiError::Storage(_)
            | ApiError::Internal(_)
            | ApiError::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }

    /// Message safe to show to the client
    fn public_message(&self, status: StatusCode) -> String {
        if status.is_server_error() {
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: code.to_string(),
                message: self.public_message(status),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn test_query_errors_map_to_status() {
        let err = ApiError::from(QueryError::InvalidRange);
        assert_eq!(
            err.status_and_code(),
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
        );

        let err = ApiError::from(QueryError::NotFound("abc".to_string()));
        assert_eq!(err.status_and_code(), (StatusCode::NOT_FOUND, "NOT_FOUND"));

        let err = ApiError::from(QueryError::Storage(StorageError::Lock("poisoned".into())));
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        );
    }

    #[test]
    fn test_auth_errors_map_to_status() {
        let cases = [
            (AuthError::InvalidInput("bad email".into()), StatusCode::BAD_REQUEST),
            (AuthError::EmailTaken, StatusCode::CONFLICT),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::MissingToken, StatusCode::UNAUTHORIZED),
            (AuthError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AuthError::Hash("oom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_and_code().0, status);
        }

        let err = ApiError::RateLimited("slow down".into());
        assert_eq!(
            err.status_and_code(),
            (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED")
        );
    }

    #[test]
    fn test_internal_detail_hidden() {
        let err = ApiError::Storage(StorageError::Lock("secret detail".into()));
        let (status, _) = err.status_and_code();
        assert_eq!(err.public_message(status), "Internal server error");

        let err = ApiError::Validation("limit must be at least 1".into());
        let (status, _) = err.status_and_code();
        assert_eq!(err.public_message(status), "limit must be at least 1");
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::NotFound("gone".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::Internal("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
