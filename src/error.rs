//! Error types for Trophy Case
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::psn::PsnError;

/// PSN error code returned when the target account's privacy settings
/// block access to its trophies.
pub const PSN_ACCESS_CONTROL_CODE: i64 = 2_240_526;

/// Application-wide error type
///
/// This enum represents all possible errors that can occur
/// in the application. It implements `IntoResponse` to
/// automatically convert errors to appropriate HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Resource not found")]
    NotFound,

    /// NPSSO or authorization code exchange rejected (401)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Missing, expired or errored session (401)
    #[error("Your session has expired, please authenticate again.")]
    Unauthorized,

    /// Upstream denied access to the target account (403)
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Validation error (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// PSN API error (502)
    #[error("PSN error: {0}")]
    Psn(String),

    /// Game metadata API error (502)
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Signing key error (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<PsnError> for AppError {
    /// Categorize PSN failures
    ///
    /// The access-control code is surfaced as `Forbidden` so callers can
    /// tell a private profile apart from a generic upstream failure.
    fn from(err: PsnError) -> Self {
        match err {
            PsnError::Api {
                code: Some(PSN_ACCESS_CONTROL_CODE),
                message,
                ..
            } => AppError::Forbidden(message),
            PsnError::Api { status: 401, .. } => AppError::Unauthorized,
            PsnError::Authentication(message) => AppError::Authentication(message),
            PsnError::Transport(e) => AppError::HttpClient(e),
            other => AppError::Psn(other.to_string()),
        }
    }
}

impl AppError {
    /// Short machine-readable kind, used in the response body and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound => "not_found",
            AppError::Authentication(_) => "authentication",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Validation(_) => "validation",
            AppError::Database(_) => "database",
            AppError::HttpClient(_) => "http_client",
            AppError::Psn(_) => "psn",
            AppError::Metadata(_) => "metadata",
            AppError::Config(_) => "config",
            AppError::Encryption(_) => "encryption",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, error_message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Authentication(_) | AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, self.to_string())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Psn(msg) | AppError::Metadata(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
            AppError::Config(msg) | AppError::Encryption(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[self.kind()]).inc();

        let body = Json(serde_json::json!({
            "error": error_message,
            "type": self.kind(),
        }));

        (status, body).into_response()
    }
}
