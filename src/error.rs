//! Common error types for the media generation gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Provider request failed: {0}")]
    Upstream(String),

    #[error("Provider returned an empty response: {0}")]
    EmptyResponse(String),

    #[error("Failed to decode generated payload: {0}")]
    Decode(String),

    #[error("Invalid generator selected")]
    UnknownGenerator,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Premium subscription required")]
    PremiumRequired,

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body sent to clients
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Upstream detail goes to the log, not to the client.
        let (status, message) = match &self {
            AppError::UnknownGenerator => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Json(_) => (StatusCode::BAD_REQUEST, "Invalid JSON body".to_string()),
            AppError::AuthRequired => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::PremiumRequired => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::AssetNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Upstream(_) | AppError::EmptyResponse(_) | AppError::HttpClient(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Media generation failed".to_string(),
            ),
            AppError::Decode(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Generated payload was not a valid image".to_string(),
            ),
            AppError::Timeout(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Generation timed out".to_string(),
            ),
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
