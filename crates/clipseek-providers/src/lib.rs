//! External adapter contracts for ClipSeek.
//!
//! The pipeline talks to every external system through these traits:
//! video search, caption fetch, the text model, the video model and the
//! media extractor. Concrete HTTP adapters live outside this workspace;
//! the subprocess-based extractor ships in `clipseek-media`.

pub mod error;
pub mod extractor;
pub mod search;
pub mod text_model;
pub mod transcript;
pub mod video_model;

pub use error::{
    ExtractionError, SearchError, TextModelError, TranscriptError, VideoModelError,
};
pub use extractor::MediaExtractor;
pub use search::{parse_iso8601_duration, SearchOrder, SearchProvider, SearchRequest};
pub use text_model::{RawSpan, SegmentSummary, TextModel};
pub use transcript::TranscriptProvider;
pub use video_model::{ClipAnalysis, VideoModel};
