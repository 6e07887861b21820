use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::google::GoogleApiError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Google API error: {0}")]
    Google(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<GoogleApiError> for AppError {
    fn from(err: GoogleApiError) -> Self {
        match err {
            GoogleApiError::NotAuthenticated => AppError::Unauthorized,
            other => AppError::Google(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Application not authenticated".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Invalid webhook token".to_string(),
            ),
            AppError::Google(msg) => {
                tracing::error!("Google API error: {msg}");
                (StatusCode::BAD_GATEWAY, "GOOGLE_API_ERROR", msg.clone())
            }
            AppError::AuthFailed(msg) => {
                tracing::error!("Authentication failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AUTH_FAILED",
                    format!("Authentication failed: {msg}"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
