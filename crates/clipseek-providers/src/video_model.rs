//! Video-model contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::VideoModelError;

/// Video-model output for one clip, relative to the clip's own timeline.
///
/// Like `RawSpan`, values are unvalidated; the caller checks the range
/// before converting it back to absolute video time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipAnalysis {
    /// Start within the clip, seconds from the clip's beginning.
    pub start_sec: f64,
    /// End within the clip.
    pub end_sec: f64,
    pub confidence: f64,
    pub summary: String,
}

/// Multimodal model that analyzes a local clip file.
#[async_trait]
pub trait VideoModel: Send + Sync {
    /// Locate the part of `clip_path` that answers `user_query`.
    ///
    /// May fail transiently (rate limits, upload errors); the refinement
    /// stage retries up to three times with linear backoff.
    async fn analyze_clip(
        &self,
        clip_path: &Path,
        user_query: &str,
    ) -> Result<ClipAnalysis, VideoModelError>;
}
