//! Transcript (caption) fetch contract.

use async_trait::async_trait;

use clipseek_models::Subtitle;

use crate::error::TranscriptError;

/// Caption track fetcher.
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Fetch the caption track for a video.
    ///
    /// Tries `preferred_languages` in order. Returns `None` when no caption
    /// exists in any preferred language, captions are disabled, or the
    /// video is private or unavailable. Errors are reserved for unexpected
    /// network faults.
    ///
    /// Returned chunks are sorted ascending by start time, with
    /// auto-generated tracks flagged.
    async fn fetch(
        &self,
        video_id: &str,
        preferred_languages: &[String],
    ) -> Result<Option<Subtitle>, TranscriptError>;
}
