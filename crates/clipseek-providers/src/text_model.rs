//! Text-model contract.
//!
//! All five operations are implementable against a single chat-completion
//! endpoint. Responses are JSON; adapters parse them into the raw types
//! here and surface parse failures as [`TextModelError::Parse`]. The
//! pipeline recovers from every failure at the call site, so adapters never
//! need their own fallback logic.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use clipseek_models::QueryVariants;

use crate::error::TextModelError;

/// One `(start, end, confidence, summary)` span as parsed from model JSON.
///
/// Values are unvalidated: the model may emit inverted or negative ranges
/// and out-of-range confidences. The pipeline validates before converting
/// to a `TimeRange`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSpan {
    pub start_sec: f64,
    pub end_sec: f64,
    pub confidence: f64,
    pub summary: String,
}

/// Per-segment context for the integrated summary call.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub video_title: String,
    /// Rendered time range, e.g. `866.8s-896.8s`.
    pub time_range: String,
    pub summary: String,
}

/// Chat-completion text model.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Produce three search-query variants for a user query: the original
    /// echoed back, an optimized form (5-7 tokens, domain terms in English
    /// preferred) and a simplified form (2-4 core tokens).
    async fn fan_out(&self, user_query: &str) -> Result<QueryVariants, TextModelError>;

    /// Rank a subtitle excerpt against the query.
    ///
    /// `subtitle_excerpt` is the caption track rendered with per-chunk
    /// timing (`[12.3s - 15.6s] text` lines). Returns up to three spans in
    /// absolute video time.
    async fn rank_subtitle(
        &self,
        user_query: &str,
        subtitle_excerpt: &str,
    ) -> Result<Vec<RawSpan>, TextModelError>;

    /// Select the most relevant videos by title alone.
    ///
    /// `titles` is a list of `(video_id, title)` pairs. Returns up to
    /// `max_results` ids in the model's relevance order; ids not present in
    /// the input may appear and are dropped by the caller.
    async fn filter_titles(
        &self,
        user_query: &str,
        titles: &[(String, String)],
        max_results: usize,
    ) -> Result<Vec<String>, TextModelError>;

    /// Analyze a video directly by its canonical URL, passed to the model
    /// as a video part. Fallback path for videos without captions. Returns
    /// up to three spans in absolute video time.
    async fn analyze_video_url(
        &self,
        user_query: &str,
        video_url: &str,
    ) -> Result<Vec<RawSpan>, TextModelError>;

    /// Merge per-segment summaries into one integrated answer.
    async fn integrate_summary(
        &self,
        user_query: &str,
        segment_summaries: &[SegmentSummary],
    ) -> Result<String, TextModelError>;
}
