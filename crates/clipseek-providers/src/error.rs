//! Error types raised by external adapters.
//!
//! The pipeline recovers from all of these locally; none of them escape a
//! pipeline run. See each stage for its recovery policy.

use thiserror::Error;

/// Search API failure. Treated as zero results for the failing strategy.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search API error: {0}")]
    Api(String),

    #[error("malformed search response: {0}")]
    InvalidResponse(String),
}

/// Unexpected transcript-fetch failure.
///
/// "No captions available" is not an error; providers signal it by
/// returning `None` from `fetch`.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("transcript fetch failed: {0}")]
    Network(String),
}

/// Text-model failure, including unparseable responses.
#[derive(Debug, Error)]
pub enum TextModelError {
    #[error("text model API error: {0}")]
    Api(String),

    #[error("failed to parse text model response: {0}")]
    Parse(String),
}

/// Video-model failure. Retried with linear backoff by the caller.
#[derive(Debug, Error)]
pub enum VideoModelError {
    #[error("video model API error: {0}")]
    Api(String),

    #[error("failed to parse video model response: {0}")]
    Parse(String),
}

/// Clip extraction or concatenation failure.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction failed: {0}")]
    Failed(String),

    #[error("extraction timed out after {0} seconds")]
    Timeout(u64),

    #[error("invalid output container: {0}")]
    InvalidOutput(String),

    #[error("extraction cancelled")]
    Cancelled,
}
