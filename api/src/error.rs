use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use solace_core::error::{self, ApiError};

use crate::chat::ChatError;

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Missing, malformed or expired credentials (401)
    Unauthorized {
        message: String,
        docs_hint: Option<String>,
    },
    /// Authenticated but not allowed (403)
    Forbidden {
        message: String,
        docs_hint: Option<String>,
    },
    /// Resource not found (404)
    NotFound { resource: String },
    /// Unique value already taken (409)
    Conflict { message: String, field: Option<String> },
    /// Completion service failed and no fallback was configured (502)
    Upstream(String),
    /// Database error (500)
    Database(sqlx::Error),
    /// Internal error (500)
    Internal(String),
}

impl AppError {
    fn status_and_body(self, request_id: String) -> (StatusCode, ApiError) {
        let body = |error: &str, message: String| ApiError {
            error: error.to_string(),
            message,
            field: None,
            received: None,
            request_id: request_id.clone(),
            docs_hint: None,
        };

        match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    field,
                    received,
                    docs_hint,
                    ..body(error::codes::VALIDATION_FAILED, message)
                },
            ),
            AppError::Unauthorized { message, docs_hint } => (
                StatusCode::UNAUTHORIZED,
                ApiError {
                    docs_hint,
                    ..body(error::codes::UNAUTHORIZED, message)
                },
            ),
            AppError::Forbidden { message, docs_hint } => (
                StatusCode::FORBIDDEN,
                ApiError {
                    docs_hint,
                    ..body(error::codes::FORBIDDEN, message)
                },
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                body(error::codes::NOT_FOUND, format!("{resource} not found")),
            ),
            AppError::Conflict { message, field } => (
                StatusCode::CONFLICT,
                ApiError {
                    field,
                    ..body(error::codes::CONFLICT, message)
                },
            ),
            AppError::Upstream(detail) => {
                tracing::error!("Upstream error: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    ApiError {
                        docs_hint: Some("Retry the message in a moment.".to_string()),
                        ..body(
                            error::codes::UPSTREAM_UNAVAILABLE,
                            "The assistant is unavailable right now".to_string(),
                        )
                    },
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body(
                        error::codes::INTERNAL_ERROR,
                        "An internal error occurred".to_string(),
                    ),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body(
                        error::codes::INTERNAL_ERROR,
                        "An internal error occurred".to_string(),
                    ),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();
        let (status, api_error) = self.status_and_body(request_id);
        (status, Json(api_error)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Validation(message) => AppError::Validation {
                message,
                field: Some("message".to_string()),
                received: None,
                docs_hint: Some("Send a non-empty 'message' string.".to_string()),
            },
            ChatError::Upstream(err) => AppError::Upstream(err.to_string()),
            ChatError::Storage(err) => AppError::Internal(err.to_string()),
        }
    }
}

/// Postgres unique_violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}
