//! Multi-stage video segment extraction pipeline.
//!
//! Takes a natural-language query and produces a ranked list of short
//! video segments that answer it. The run sequences five stages:
//!
//! 1. Query fan-out into three search variants
//! 2. Multi-strategy search with first-seen deduplication
//! 3. Title-level relevance filtering
//! 4. Parallel transcript analysis (bounded pool of five workers, with a
//!    URL-analysis fallback for caption-less videos)
//! 5. Parallel clip extraction and video-model refinement (bounded pool
//!    with staggered admission and linear-backoff retries)
//!
//! Every external failure is recovered locally; a run only errs on
//! invalid configuration or cancellation. The integrated-summary
//! generator and clip concatenation run after the pipeline on its output.

pub mod cancel;
pub mod config;
pub mod error;
pub mod fanout;
pub mod pipeline;
pub mod progress;
pub mod refine_stage;
pub mod retry;
pub mod search;
pub mod sinks;
pub mod summary;
pub mod telemetry;
pub mod title_filter;
pub mod transcript_stage;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::SegmentPipeline;
pub use search::SearchOutcome;
pub use sinks::{ClipSink, ProgressSink, SubtitleSink};
pub use summary::integrated_summary;
pub use telemetry::init_tracing;
pub use transcript_stage::TranscriptCounters;
