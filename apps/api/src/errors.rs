use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::providers::{FetchError, ProviderError};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Per-candidate failures (`Parse`, `Fetch`) are caught inside a discovery run and
/// only reach a handler when a single document was requested directly.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::ProviderUnavailable(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Parse(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "PARSE_ERROR",
                msg.clone(),
            ),
            AppError::Fetch(e) => {
                tracing::warn!("Fetch error: {e}");
                (StatusCode::BAD_GATEWAY, "FETCH_ERROR", e.to_string())
            }
            AppError::ProviderUnavailable(msg) => {
                tracing::error!("Provider unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PROVIDER_UNAVAILABLE",
                    "The search provider could not be reached".to_string(),
                )
            }
            AppError::Config(msg) => (StatusCode::BAD_REQUEST, "CONFIG_ERROR", msg.clone()),
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
