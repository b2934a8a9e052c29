//! Pipeline error types.
//!
//! Per-stage failures (search, transcripts, model calls, extraction) are
//! recovered inside their stages and never escape a run. Only invalid
//! configuration and external cancellation reach the caller.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("pipeline cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
