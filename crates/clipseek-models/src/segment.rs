//! Candidates, refined segments and the final search result.

use serde::Serialize;

use crate::time::TimeRange;
use crate::video::Video;

/// Summary text used for segments whose video-model refinement failed.
pub const REFINEMENT_FAILED_SUMMARY: &str = "(refinement failed)";

/// Confidence assigned to degraded segments.
pub const DEGRADED_CONFIDENCE: f64 = 0.5;

/// A coarse match produced by the transcript stage, pre-refinement.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub video: Video,
    pub time_range: TimeRange,
    /// Relevance confidence in `[0, 1]`. Candidates below the configured
    /// minimum are dropped before this type is constructed.
    pub confidence: f64,
    pub summary: String,
}

/// A refined (or degraded) segment in absolute video time.
#[derive(Debug, Clone, Serialize)]
pub struct VideoSegment {
    pub video: Video,
    pub time_range: TimeRange,
    pub summary: String,
    pub confidence: f64,
}

impl VideoSegment {
    /// Use a candidate's range verbatim, without video-model refinement.
    pub fn from_candidate(candidate: Candidate) -> Self {
        Self {
            video: candidate.video,
            time_range: candidate.time_range,
            summary: candidate.summary,
            confidence: candidate.confidence,
        }
    }

    /// Degraded segment emitted when refinement fails after retries: the
    /// original candidate range with the sentinel summary.
    pub fn degraded(candidate: Candidate) -> Self {
        Self {
            video: candidate.video,
            time_range: candidate.time_range,
            summary: REFINEMENT_FAILED_SUMMARY.to_string(),
            confidence: DEGRADED_CONFIDENCE,
        }
    }

    /// Whether this segment carries the refinement-failure sentinel.
    pub fn is_degraded(&self) -> bool {
        self.summary == REFINEMENT_FAILED_SUMMARY && self.confidence == DEGRADED_CONFIDENCE
    }
}

/// The terminal pipeline output.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// The user's query, verbatim.
    pub query: String,
    /// Segments sorted by confidence descending (pre-refinement order).
    pub segments: Vec<VideoSegment>,
    /// Wall-clock processing time measured on a monotonic clock.
    pub processing_time_sec: f64,
}

impl SearchResult {
    /// An empty result for runs that found nothing.
    pub fn empty(query: &str, processing_time_sec: f64) -> Self {
        Self {
            query: query.to_string(),
            segments: Vec::new(),
            processing_time_sec,
        }
    }
}
