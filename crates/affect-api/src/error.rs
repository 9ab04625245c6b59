//! API error types.
//!
//! Clients get a status code and `{ "error": <kind>, "message": <text> }`.
//! Underlying causes are logged, never serialized.

use affect_media::MediaError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error(transparent)]
    Media(#[from] MediaError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Stable error kind reported to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidFileType(_) => "invalid_file_type",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::RateLimited => "rate_limited",
            ApiError::Media(e) => match e {
                MediaError::EmptyClip => "empty_clip",
                MediaError::FrameReadFailure { .. } => "frame_read_failure",
                MediaError::InvalidImage(_) => "invalid_image",
                MediaError::InvalidVideo(_) | MediaError::UnsupportedFormat(_) => "invalid_video",
                MediaError::ModelLoadFailure { .. } => "model_load_failure",
                MediaError::Inference(_) | MediaError::Io(_) | MediaError::Internal(_) => {
                    "internal"
                }
            },
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidFileType(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Media(e) => match e {
                MediaError::InvalidImage(_) => StatusCode::BAD_REQUEST,
                MediaError::EmptyClip
                | MediaError::FrameReadFailure { .. }
                | MediaError::InvalidVideo(_) => StatusCode::UNPROCESSABLE_ENTITY,
                MediaError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                MediaError::ModelLoadFailure { .. } => StatusCode::SERVICE_UNAVAILABLE,
                MediaError::Inference(_) | MediaError::Io(_) | MediaError::Internal(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Short client-facing message.
    fn message(&self) -> String {
        match self {
            ApiError::InvalidFileType(_) => {
                "Please upload either an MP4 or AVI video file".to_string()
            }
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::RateLimited => "Rate limit exceeded. Please try again later.".to_string(),
            ApiError::Media(e) => match e {
                MediaError::EmptyClip | MediaError::FrameReadFailure { .. } => e.to_string(),
                MediaError::InvalidImage(_) => "Could not decode image".to_string(),
                MediaError::InvalidVideo(_) => "Could not decode video".to_string(),
                MediaError::UnsupportedFormat(_) => "Video decoding is not available".to_string(),
                MediaError::ModelLoadFailure { .. } => "Model is unavailable".to_string(),
                MediaError::Inference(_) | MediaError::Io(_) | MediaError::Internal(_) => {
                    "An internal error occurred".to_string()
                }
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(kind = self.kind(), error = %self, "Request failed");
        } else {
            warn!(kind = self.kind(), error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: self.kind(),
            message: self.message(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_error_mapping() {
        let err = ApiError::from(MediaError::EmptyClip);
        assert_eq!(err.kind(), "empty_clip");
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        let err = ApiError::from(MediaError::FrameReadFailure { index: 0 });
        assert_eq!(err.kind(), "frame_read_failure");
        assert_eq!(err.message(), "Failed to read frame at index 0");

        let err = ApiError::from(MediaError::model_load_failure("m.onnx", "missing"));
        assert_eq!(err.kind(), "model_load_failure");
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let err = ApiError::from(MediaError::inference("ORT run failed: tensor mismatch"));
        assert_eq!(err.kind(), "internal");
        assert!(!err.message().contains("ORT"));
    }

    #[test]
    fn test_invalid_image_message() {
        let err = ApiError::from(MediaError::invalid_image("png: bad signature"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Could not decode image");
    }
}
