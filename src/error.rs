//! Error types for the store, the podcast pipeline and the HTTP layer.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Failures of the ranked store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store snapshot is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failures of podcast generation and artifact handling.
#[derive(Debug, Error)]
pub enum PodcastError {
    /// The text-generation or speech service failed or returned nothing usable.
    #[error("upstream service failed: {0}")]
    Upstream(String),
    /// A single script line does not fit in one speech request.
    #[error("line {line} is {bytes} bytes, exceeding the {max} byte limit")]
    SizeViolation { line: usize, bytes: usize, max: usize },
    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid filename: {0}")]
    InvalidName(String),
    #[error("file not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for PodcastError {
    fn from(err: reqwest::Error) -> Self {
        PodcastError::Upstream(err.to_string())
    }
}

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "data": null,
            "message": self.message,
            "code": self.status.as_u16(),
        }));
        (self.status, body).into_response()
    }
}

impl From<PodcastError> for ApiError {
    fn from(err: PodcastError) -> Self {
        match &err {
            PodcastError::InvalidName(_) => ApiError::bad_request("Invalid filename."),
            PodcastError::NotFound(_) => ApiError::not_found("File not found."),
            _ => {
                tracing::error!(error = %err, "Request failed");
                ApiError::internal("Internal server error.")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Store access failed");
        ApiError::internal("Internal server error.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_podcast_error_maps_to_status() {
        let e: ApiError = PodcastError::InvalidName("a.wav".into()).into();
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        let e: ApiError = PodcastError::NotFound("a.mp3".into()).into();
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        let e: ApiError = PodcastError::Upstream("boom".into()).into();
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_size_violation_message() {
        let e = PodcastError::SizeViolation {
            line: 3,
            bytes: 5000,
            max: 4000,
        };
        assert_eq!(
            e.to_string(),
            "line 3 is 5000 bytes, exceeding the 4000 byte limit"
        );
    }
}
