//! Error handling for the bookshelf HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Uniform error envelope returned by every failing request
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub success: bool,
    pub error_code: u16,
    pub message: String,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match self {
            AppError::BadRequest { message } | AppError::NotFound { message } => {
                tracing::debug!(status_code = %status.as_u16(), %message, "request rejected");
                message
            }
            AppError::MethodNotAllowed => {
                tracing::debug!(status_code = %status.as_u16(), "method not allowed");
                "method not allowed".to_string()
            }
            AppError::Internal(e) => {
                let error_id = Uuid::now_v7();
                tracing::error!(
                    error_id = %error_id,
                    status_code = %status.as_u16(),
                    error = ?e,
                    "request failed"
                );
                "internal server error".to_string()
            }
        };

        let body = ErrorBody {
            success: false,
            error_code: status.as_u16(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Fallback for known routes hit with an unsupported method
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Fallback for unknown routes
pub async fn route_not_found() -> AppError {
    AppError::not_found("resource not found")
}
