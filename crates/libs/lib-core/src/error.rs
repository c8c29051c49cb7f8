//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`] used consistently
//! across the services and handlers. It follows the `thiserror` pattern for ergonomic
//! error handling.
//!
//! ## Error Categories
//!
//! 1. **Client Errors** (4xx)
//!    - [`InvalidInput`](AppError::InvalidInput) → 400 Bad Request
//!    - [`Unauthenticated`](AppError::Unauthenticated) → 401 Unauthorized
//!    - [`NotFound`](AppError::NotFound) → 404 Not Found
//!
//! 2. **Server Errors** (5xx)
//!    - [`StorageUnavailable`](AppError::StorageUnavailable) → 500, with a diagnostic `message`
//!    - [`Config`](AppError::Config) → 500
//!    - [`Internal`](AppError::Internal) → 500
//!
//! A caller that is not a participant of a conversation gets [`NotFound`](AppError::NotFound),
//! exactly like a caller asking for a conversation that does not exist. The two cases are
//! indistinguishable on the wire.
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_core::error::{AppError, Result};
//!
//! fn require_content(content: &str) -> Result<&str> {
//!     if content.trim().is_empty() {
//!         return Err(AppError::InvalidInput("Content is required".to_string()));
//!     }
//!     Ok(content)
//! }
//! ```
//!
//! ## Error Conversion
//!
//! - `From<sqlx::Error>` - pool/io failures become `StorageUnavailable`, missing rows
//!   become `NotFound`, anything else `Internal`
//! - `From<anyhow::Error>` - `Internal`

use thiserror::Error;
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};

use crate::dto::ErrorResponse;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-wide error type covering all error scenarios.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input.
    ///
    /// **HTTP Status**: 400 Bad Request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No valid session.
    ///
    /// **HTTP Status**: 401 Unauthorized
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Target absent, or caller lacks conversation membership.
    ///
    /// **HTTP Status**: 404 Not Found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database unreachable.
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Configuration error during startup or environment loading.
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other failure.
    ///
    /// **HTTP Status**: 500 Internal Server Error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StorageUnavailable(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a user-friendly error message.
    ///
    /// For server errors, returns a generic message to avoid exposing implementation details.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::Unauthenticated(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::StorageUnavailable(_) => "Database connection failed".to_string(),
            AppError::Config(_) | AppError::Internal(_) => "An internal error occurred".to_string(),
        }
    }

    /// Stable machine-readable code for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Unauthenticated(_) => "Unauthenticated",
            AppError::NotFound(_) => "NotFound",
            AppError::StorageUnavailable(_) => "StorageUnavailable",
            AppError::Config(_) => "Config",
            AppError::Internal(_) => "Internal",
        }
    }
}

/// Implement Axum's `IntoResponse` for automatic error handling.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Server error: {}", self);
        } else {
            tracing::debug!("Client error: {}", self);
        }

        let message = match &self {
            AppError::StorageUnavailable(diagnostic) => Some(diagnostic.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.user_message(),
            code: Some(self.code().to_string()),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert `sqlx::Error` to `AppError`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Database record not found".to_string()),
            e @ (sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed) => AppError::StorageUnavailable(e.to_string()),
            sqlx::Error::Database(db_err) => {
                AppError::Internal(format!("Database error: {}", db_err.message()))
            }
            other => AppError::Internal(format!("Database error: {}", other)),
        }
    }
}
