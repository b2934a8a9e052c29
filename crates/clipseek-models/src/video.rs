//! Video metadata as returned by the search stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for a single video.
///
/// Immutable after creation; every later stage refers to a video by its
/// `video_id`, which stays stable across the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    /// Opaque, unique video identifier.
    pub video_id: String,
    /// Video title.
    pub title: String,
    /// Channel name.
    pub channel: String,
    /// Duration in seconds.
    pub duration_sec: u32,
    /// Publication timestamp (UTC).
    pub published_at: DateTime<Utc>,
    /// Thumbnail URL.
    pub thumbnail_url: String,
}

impl Video {
    /// Canonical watch URL, used for byte-range extraction and for passing
    /// the video directly to the text model when captions are missing.
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_canonical_url() {
        let video = Video {
            video_id: "abc123def45".to_string(),
            title: "Test".to_string(),
            channel: "Channel".to_string(),
            duration_sec: 600,
            published_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            thumbnail_url: String::new(),
        };
        assert_eq!(video.url(), "https://www.youtube.com/watch?v=abc123def45");
    }
}
