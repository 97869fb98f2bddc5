use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalog_search::{EvalError, SearchError};
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Message returned for every 500; the cause only goes to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid value for parameter '{name}': {value}")]
    InvalidParameter { name: String, value: String },

    #[error("Rate limit exceeded. Maximum {0} requests per minute allowed.")]
    RateLimited(u32),

    #[error("The requested resource was not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// API error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
    pub status: u16,
}

impl ServerError {
    pub fn invalid_parameter(name: &str, value: &str) -> Self {
        ServerError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::InvalidParameter { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServerError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::Validation(_) => "validation_error",
            ServerError::InvalidParameter { .. } => "invalid_parameter",
            ServerError::RateLimited(_) => "rate_limited",
            ServerError::NotFound => "not_found",
            ServerError::Internal(_) | ServerError::Config(_) => "internal_error",
        }
    }

    fn details(&self) -> String {
        match self {
            ServerError::Internal(_) | ServerError::Config(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match status {
            StatusCode::INTERNAL_SERVER_ERROR => tracing::error!(error = %self, "request failed"),
            _ => tracing::warn!(code = self.error_code(), error = %self, "request rejected"),
        }

        let body = ErrorResponse {
            error: self.error_code().to_string(),
            details: self.details(),
            status: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<SearchError> for ServerError {
    fn from(err: SearchError) -> Self {
        ServerError::Validation(err.to_string())
    }
}

impl From<EvalError> for ServerError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::InvalidK(_) => ServerError::Validation(err.to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
