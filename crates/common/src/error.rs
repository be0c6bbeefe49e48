//! Error types for facility-admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Comment not found: {0}")]
    CommentNotFound(String),

    #[error("Post not found: {0}")]
    PostNotFound(String),

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid {entity} status transition: {from} -> {to}")]
    InvalidTransition {
        /// Kind of record whose status was being changed.
        entity: &'static str,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    // === Server Errors ===
    #[error("Datastore error: {0}")]
    Datastore(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::CommentNotFound(_)
            | Self::PostNotFound(_)
            | Self::ReportNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidTransition { .. } => StatusCode::CONFLICT,

            // 5xx Server Errors
            Self::Datastore(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::CommentNotFound(_) => "COMMENT_NOT_FOUND",
            Self::PostNotFound(_) => "POST_NOT_FOUND",
            Self::ReportNotFound(_) => "REPORT_NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Datastore(_) => "DATASTORE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
