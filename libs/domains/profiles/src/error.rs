use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use core_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Invalid profile: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Summary error: {0}")]
    Summary(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Vector index not ready: {0}")]
    IndexNotReady(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ProfileResult<T> = Result<T, ProfileError>;

impl From<qdrant_client::QdrantError> for ProfileError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        ProfileError::Index(err.to_string())
    }
}

impl From<ConfigError> for ProfileError {
    fn from(err: ConfigError) -> Self {
        ProfileError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ProfileError {
    fn from(err: serde_json::Error) -> Self {
        ProfileError::Internal(format!("JSON error: {}", err))
    }
}

/// Convert ProfileError to AppError for standardized HTTP error responses
impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Validation(msg) => AppError::BadRequest(msg),
            err @ (ProfileError::Embedding(_)
            | ProfileError::Summary(_)
            | ProfileError::Index(_)) => AppError::BadGateway(err.to_string()),
            err @ ProfileError::IndexNotReady(_) => AppError::ServiceUnavailable(err.to_string()),
            err @ ProfileError::Config(_) => AppError::InternalServerError(err.to_string()),
            ProfileError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ProfileError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
