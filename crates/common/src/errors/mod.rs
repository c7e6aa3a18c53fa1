//! Error types for Athena services
//!
//! Provides a single error enum shared by the API, the domain core and the
//! scheduled tasks, with:
//! - HTTP status code mapping
//! - Structured JSON error responses
//! - Machine-readable error codes

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidFormat,

    // Authentication errors (2xxx)
    Unauthorized,
    InvalidCredentials,
    InvalidToken,
    ExpiredToken,

    // Authorization errors (3xxx)
    Forbidden,

    // Resource errors (4xxx)
    NotFound,

    // Conflict errors (5xxx)
    Conflict,

    // Rate limiting (6xxx)
    RateLimited,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // External service errors (8xxx)
    UpstreamError,
    EmailError,
    CacheError,
    LockError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,

    // Service unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidFormat => 1002,

            ErrorCode::Unauthorized => 2001,
            ErrorCode::InvalidCredentials => 2002,
            ErrorCode::InvalidToken => 2003,
            ErrorCode::ExpiredToken => 2004,

            ErrorCode::Forbidden => 3001,

            ErrorCode::NotFound => 4001,

            ErrorCode::Conflict => 5001,

            ErrorCode::RateLimited => 6001,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            ErrorCode::UpstreamError => 8001,
            ErrorCode::EmailError => 8002,
            ErrorCode::CacheError => 8003,
            ErrorCode::LockError => 8004,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,

            ErrorCode::ServiceUnavailable => 9999,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    // Authorization errors
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    // Resource errors
    #[error("{resource_type} not found with id: {id}")]
    NotFound { resource_type: String, id: String },

    // Conflict errors
    #[error("{resource_type} already exists with {field}: {value}")]
    Duplicate {
        resource_type: String,
        field: String,
        value: String,
    },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // External service errors
    #[error("Upstream service '{service}' failed: {message}")]
    Upstream { service: String, message: String },

    #[error("Email delivery failed: {message}")]
    Email { message: String },

    #[error("Cache error: {message}")]
    CacheError { message: String },

    #[error("Lock error: {message}")]
    Lock { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Shorthand for a missing resource
    pub fn not_found(resource_type: &str, id: impl ToString) -> Self {
        AppError::NotFound {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        }
    }

    /// Shorthand for a uniqueness violation
    pub fn duplicate(resource_type: &str, field: &str, value: impl ToString) -> Self {
        AppError::Duplicate {
            resource_type: resource_type.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Shorthand for an upstream HTTP failure
    pub fn upstream(service: &str, message: impl Into<String>) -> Self {
        AppError::Upstream {
            service: service.to_string(),
            message: message.into(),
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::InvalidToken => ErrorCode::InvalidToken,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::Duplicate { .. } => ErrorCode::Conflict,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Upstream { .. } | AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Email { .. } => ErrorCode::EmailError,
            AppError::CacheError { .. } => ErrorCode::CacheError,
            AppError::Lock { .. } => ErrorCode::LockError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } | AppError::InvalidFormat { .. } => {
                StatusCode::BAD_REQUEST
            }

            // 401 Unauthorized
            AppError::Unauthorized { .. }
            | AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::ExpiredToken => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,

            // 404 Not Found
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Duplicate { .. } => StatusCode::CONFLICT,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::Database(_)
            | AppError::DatabaseConnection { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::Upstream { .. } | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            AppError::Email { .. }
            | AppError::CacheError { .. }
            | AppError::Lock { .. }
            | AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Validation {
                field: Some(field), ..
            } => Some(serde_json::json!({ "field": field })),
            AppError::Duplicate { field, value, .. } => {
                Some(serde_json::json!({ "field": field, "value": value }))
            }
            _ => None,
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details: self.details(),
                // x-request-id is echoed on the response headers
                request_id: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::CacheError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = AppError::not_found("Agency", "8d7c");
        assert_eq!(err.to_string(), "Agency not found with id: 8d7c");
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_duplicate_message() {
        let err = AppError::duplicate("Opportunity", "noticeId", "W912-24-R-0001");
        assert_eq!(
            err.to_string(),
            "Opportunity already exists with noticeId: W912-24-R-0001"
        );
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code().as_code(), 5001);
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "title: must not be blank".into(),
            field: Some("title".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
        assert_eq!(err.details(), Some(serde_json::json!({ "field": "title" })));
    }

    #[test]
    fn test_auth_errors_are_401() {
        for err in [
            AppError::InvalidCredentials,
            AppError::InvalidToken,
            AppError::ExpiredToken,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_upstream_and_server_errors() {
        let err = AppError::upstream("claude", "503 Service Unavailable");
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.is_server_error());

        let err = AppError::Internal {
            message: "Something went wrong".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::NotFound).unwrap();
        assert_eq!(json, "\"NOT_FOUND\"");
    }
}
