use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Machine-readable payload carried by every client-facing error variant.
///
/// `code` is the stable contract; `message` is human-oriented and may change.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorDetail {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(ErrorDetail),

    #[error("Bad request: {0}")]
    BadRequest(ErrorDetail),

    #[error("Not found: {0}")]
    NotFound(ErrorDetail),

    #[error("Unauthorized: {0}")]
    Unauthorized(ErrorDetail),

    #[error("Forbidden: {0}")]
    Forbidden(ErrorDetail),

    #[error("Operation not allowed: {0}")]
    OperationNotAllowed(ErrorDetail),

    #[error("Conflict: {0}")]
    Conflict(ErrorDetail),

    #[error("Gone: {0}")]
    Gone(ErrorDetail),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(
            ErrorDetail::new("VALIDATION_ERROR", "Request validation failed")
                .with_details(serde_json::to_value(&err).unwrap_or(serde_json::Value::Null)),
        )
    }
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();

        let (status, detail) = match self {
            AppError::Validation(d) => (StatusCode::BAD_REQUEST, d),
            AppError::BadRequest(d) => (StatusCode::BAD_REQUEST, d),
            AppError::NotFound(d) => (StatusCode::NOT_FOUND, d),
            AppError::Unauthorized(d) => (StatusCode::UNAUTHORIZED, d),
            AppError::Forbidden(d) => (StatusCode::FORBIDDEN, d),
            AppError::OperationNotAllowed(d) => (StatusCode::FORBIDDEN, d),
            AppError::Conflict(d) => (StatusCode::CONFLICT, d),
            AppError::Gone(d) => (StatusCode::GONE, d),
            AppError::Internal(err) => {
                // Never leak internals; the request id correlates the log line.
                tracing::error!(request_id = %request_id, error = ?err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorDetail::new("INTERNAL_ERROR", "Internal server error"),
                )
            }
            AppError::Config(err) => {
                tracing::error!(request_id = %request_id, error = ?err, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorDetail::new("INTERNAL_ERROR", "Internal server error"),
                )
            }
        };

        let envelope = ErrorEnvelope {
            error: detail.code.to_string(),
            message: detail.message,
            details: detail.details,
            timestamp: Utc::now(),
            request_id,
        };

        (status, Json(envelope)).into_response()
    }
}
