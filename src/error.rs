//! Error types for sulabh-auth
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input (400)
    #[error("{0}")]
    Validation(String),

    /// Bad credentials or no/invalid session (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Role mismatch (403)
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("Resource not found")]
    NotFound,

    /// Duplicate identity (409)
    #[error("{0}")]
    Conflict(String),

    /// Too many login attempts (429)
    #[error("Too many failed login attempts. Please try again in 15 minutes.")]
    RateLimited,

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing backend failure (500)
    #[error("Password hashing error: {0}")]
    Hashing(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to a status code, a stable machine-readable
    /// error kind, and a human message. Internal detail (store errors,
    /// hashing backend errors) is logged and never echoed to the client.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_kind, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                self.to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database",
                    "Internal server error".to_string(),
                )
            }
            AppError::Hashing(e) => {
                tracing::error!(error = %e, "Password hashing error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "hashing",
                    "Internal server error".to_string(),
                )
            }
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                )
            }
        };

        // Record error metric
        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_kind]).inc();

        let body = Json(serde_json::json!({
            "error": error_kind,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
