//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use clipseek_providers::ExtractionError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during clip extraction and concatenation.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("ffprobe not found in PATH")]
    FfprobeNotFound,

    #[error("yt-dlp not found in PATH")]
    YtDlpNotFound,

    #[error("ffmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("ffprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("failed to resolve stream URLs: {0}")]
    StreamUrlsFailed(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("invalid video file: {0}")]
    InvalidVideo(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an ffmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }
}

impl From<MediaError> for ExtractionError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Cancelled => ExtractionError::Cancelled,
            MediaError::Timeout(secs) => ExtractionError::Timeout(secs),
            MediaError::InvalidVideo(message) => ExtractionError::InvalidOutput(message),
            other => ExtractionError::Failed(other.to_string()),
        }
    }
}
