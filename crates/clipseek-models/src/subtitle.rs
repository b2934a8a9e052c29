//! Subtitle data produced by the transcript stage.

use serde::{Deserialize, Serialize};

/// One timed caption chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleChunk {
    /// Chunk start in seconds (absolute video time).
    pub start_sec: f64,
    /// Chunk end in seconds. `start_sec <= end_sec`.
    pub end_sec: f64,
    /// Caption text. Non-empty.
    pub text: String,
}

/// Full caption track for one video.
///
/// Chunks are sorted ascending by `start_sec` and may overlap weakly.
/// Produced once per video and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    pub video_id: String,
    /// Language code of the track, e.g. `ja` or `en`.
    pub language: String,
    /// Whether the track was auto-generated.
    pub is_auto_generated: bool,
    pub chunks: Vec<SubtitleChunk>,
}

impl Subtitle {
    /// Render the chunks with their timing for a text-model prompt, one
    /// `[12.3s - 15.6s] text` line per chunk.
    pub fn formatted_chunks(&self) -> String {
        self.chunks
            .iter()
            .map(|chunk| {
                format!(
                    "[{:.1}s - {:.1}s] {}",
                    chunk.start_sec, chunk.end_sec, chunk.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
