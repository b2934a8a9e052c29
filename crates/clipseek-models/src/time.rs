//! Time range value type and coordinate conversions.
//!
//! All pipeline timing flows through `TimeRange`. Caption timestamps and
//! refined segment times share the absolute `[0, video.duration]` space;
//! video-model output is relative to a downloaded clip and is mapped back
//! with [`convert_relative_to_absolute`].

use serde::Serialize;
use thiserror::Error;

/// Error returned when a time range fails validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimeRangeError {
    #[error("invalid time range: start={start}s end={end}s")]
    InvalidRange { start: f64, end: f64 },
}

/// Half-open time range in seconds.
///
/// Invariants: `start_sec >= 0` and `end_sec > start_sec`. Both bounds are
/// finite. Construction through [`TimeRange::new`] is the only way to build
/// one, so a `TimeRange` in hand is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    start_sec: f64,
    end_sec: f64,
}

impl TimeRange {
    /// Create a validated time range.
    pub fn new(start_sec: f64, end_sec: f64) -> Result<Self, TimeRangeError> {
        if !start_sec.is_finite() || !end_sec.is_finite() || start_sec < 0.0 || end_sec <= start_sec
        {
            return Err(TimeRangeError::InvalidRange {
                start: start_sec,
                end: end_sec,
            });
        }
        Ok(Self { start_sec, end_sec })
    }

    /// Start of the range in seconds.
    pub fn start_sec(&self) -> f64 {
        self.start_sec
    }

    /// End of the range in seconds.
    pub fn end_sec(&self) -> f64 {
        self.end_sec
    }

    /// Range length in seconds. Always positive.
    pub fn duration_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }

    /// Expand symmetrically by `ratio * duration`.
    ///
    /// The lower bound is clamped to zero. The upper bound is left
    /// unclamped; callers clamp against the video duration downstream when
    /// they know it.
    pub fn with_buffer(&self, ratio: f64) -> TimeRange {
        let buffer_sec = self.duration_sec() * ratio;
        TimeRange {
            start_sec: (self.start_sec - buffer_sec).max(0.0),
            end_sec: self.end_sec + buffer_sec,
        }
    }

    /// ffmpeg `-ss` argument for the range start (`HH:MM:SS.cc`).
    pub fn to_ffmpeg_ss(&self) -> String {
        format_hhmmss_cc(self.start_sec)
    }

    /// ffmpeg `-t` argument for the range duration (`HH:MM:SS.cc`).
    pub fn to_ffmpeg_t(&self) -> String {
        format_hhmmss_cc(self.duration_sec())
    }
}

/// Convert a clip-relative range to absolute video time.
///
/// `clip_start_sec` is where the clip begins in the source video. The
/// conversion is a plain translation, so it round-trips exactly:
/// `convert(c, TimeRange(a, b)) == TimeRange(c + a, c + b)`.
pub fn convert_relative_to_absolute(clip_start_sec: f64, relative: TimeRange) -> TimeRange {
    TimeRange {
        start_sec: clip_start_sec + relative.start_sec,
        end_sec: clip_start_sec + relative.end_sec,
    }
}

/// Format seconds as `HH:MM:SS.cc` with truncated centiseconds, the format
/// the media-extraction subprocess arguments use.
fn format_hhmmss_cc(total_sec: f64) -> String {
    let whole = total_sec as u64;
    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    let seconds = whole % 60;
    let centis = ((total_sec - whole as f64) * 100.0) as u64;
    format!("{:02}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis.min(99))
}
