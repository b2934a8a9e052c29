//! Progress events emitted during a pipeline run.

use serde::Serialize;

/// Pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    QueryFanOut,
    Search,
    TitleFilter,
    TranscriptAnalysis,
    Refinement,
    Finalize,
}

impl PipelinePhase {
    /// Short tag for log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::QueryFanOut => "query_fan_out",
            PipelinePhase::Search => "search",
            PipelinePhase::TitleFilter => "title_filter",
            PipelinePhase::TranscriptAnalysis => "transcript_analysis",
            PipelinePhase::Refinement => "refinement",
            PipelinePhase::Finalize => "finalize",
        }
    }
}

/// One progress update.
///
/// `progress` values within a single run are non-decreasing; the terminal
/// event carries exactly `1.0`.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub phase: PipelinePhase,
    /// Human-readable step description.
    pub step: String,
    /// Overall progress in `[0, 1]`.
    pub progress: f64,
    /// Optional structured payload (stage counters, search stats).
    pub details: Option<serde_json::Value>,
}

impl ProgressEvent {
    pub fn new(phase: PipelinePhase, step: impl Into<String>, progress: f64) -> Self {
        Self {
            phase,
            step: step.into(),
            progress,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
