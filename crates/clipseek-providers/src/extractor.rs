//! Media extraction contract.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use clipseek_models::TimeRange;

use crate::error::ExtractionError;

/// Byte-range clip extraction and concatenation.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Download only `range` of the video behind `video_url` into
    /// `output_path` as a standalone, faststart-optimized container with
    /// H.264 video and AAC audio.
    ///
    /// Implementations validate the output by probing for a video stream;
    /// a file that fails validation is an [`ExtractionError`].
    async fn extract_clip(
        &self,
        video_url: &str,
        range: TimeRange,
        output_path: &Path,
    ) -> Result<(), ExtractionError>;

    /// Concatenate already-extracted clips into `output_path`.
    ///
    /// Returns `Ok(false)` when no input survives validation, `Ok(true)`
    /// on success.
    async fn concat_clips(
        &self,
        clip_paths: &[PathBuf],
        output_path: &Path,
    ) -> Result<bool, ExtractionError>;
}
