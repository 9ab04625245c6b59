//! Error types for media and inference operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur between an upload and a decoded prediction.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Could not read video or video has no frames")]
    EmptyClip,

    #[error("Failed to read frame at index {index}")]
    FrameReadFailure { index: usize },

    #[error("Could not decode image: {0}")]
    InvalidImage(String),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to load model from {}: {reason}", path.display())]
    ModelLoadFailure { path: PathBuf, reason: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an invalid image error.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage(message.into())
    }

    /// Create an invalid video error.
    pub fn invalid_video(message: impl Into<String>) -> Self {
        Self::InvalidVideo(message.into())
    }

    /// Create a model load failure.
    pub fn model_load_failure(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ModelLoadFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an inference failure.
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
