//! Subprocess media extraction for ClipSeek.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multi-input support
//! - A runner with timeout and cancellation via tokio
//! - Byte-range clip extraction through yt-dlp stream URLs
//! - Output validation by probing for a video stream
//! - Clip concatenation with a stream-copy fast path and re-encode fallback

pub mod command;
pub mod concat;
pub mod error;
pub mod extract;
pub mod probe;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use concat::concat_clips;
pub use error::{MediaError, MediaResult};
pub use extract::YtdlpExtractor;
pub use probe::{has_video_stream, is_valid_clip};
