//! Optional observer interfaces for pipeline runs.
//!
//! All three sinks are optional and independent. They are called from
//! worker tasks, so implementations must be cheap and thread-safe.

use std::error::Error;
use std::path::Path;

use clipseek_models::{ProgressEvent, Subtitle};

/// Receives progress events during a run.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Receives each extracted clip while its temp file still exists. Errors
/// are logged and swallowed; a failing sink never affects the run.
pub trait ClipSink: Send + Sync {
    fn on_clip(
        &self,
        video_id: &str,
        clip_path: &Path,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// Receives each fetched caption track.
pub trait SubtitleSink: Send + Sync {
    fn on_subtitle(&self, video_id: &str, subtitle: &Subtitle);
}
