//! Byte-range clip extraction via yt-dlp and ffmpeg.
//!
//! Extraction never downloads a whole video: yt-dlp resolves the direct
//! stream URLs, then ffmpeg seeks into them with HTTP range requests and
//! reads only the requested window. Processing time scales with the clip
//! length, not the video length.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info};

use clipseek_models::TimeRange;
use clipseek_providers::{ExtractionError, MediaExtractor};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::concat;
use crate::error::{MediaError, MediaResult};
use crate::probe::is_valid_clip;

/// Timeout for resolving stream URLs.
const STREAM_URL_TIMEOUT: Duration = Duration::from_secs(30);

/// Subprocess timeout for an extraction, scaled to the clip length.
fn extraction_timeout_secs(clip_duration_sec: f64) -> u64 {
    (180.0 + clip_duration_sec * 0.5).max(180.0) as u64
}

/// Subprocess-based clip extractor.
#[derive(Debug, Clone, Default)]
pub struct YtdlpExtractor {
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl YtdlpExtractor {
    pub fn new() -> Self {
        Self { cancel_rx: None }
    }

    /// Propagate a cancellation signal into spawned subprocesses.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Resolve direct video and audio stream URLs without downloading.
    async fn stream_urls(&self, video_url: &str) -> MediaResult<(String, String)> {
        which::which("yt-dlp").map_err(|_| MediaError::YtDlpNotFound)?;

        debug!("resolving stream URLs for {}", video_url);

        let output = Command::new("yt-dlp")
            .args(["--youtube-skip-dash-manifest", "-g"])
            .arg(video_url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        let output = tokio::time::timeout(STREAM_URL_TIMEOUT, output)
            .await
            .map_err(|_| MediaError::Timeout(STREAM_URL_TIMEOUT.as_secs()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::StreamUrlsFailed(
                stderr.lines().last().unwrap_or("unknown error").to_string(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
        match (lines.next(), lines.next()) {
            (Some(video), Some(audio)) => Ok((video.to_string(), audio.to_string())),
            _ => Err(MediaError::StreamUrlsFailed(
                "expected separate video and audio stream URLs".to_string(),
            )),
        }
    }

    /// Download `range` of the video into `output_path`.
    pub async fn extract(
        &self,
        video_url: &str,
        range: TimeRange,
        output_path: &Path,
    ) -> MediaResult<()> {
        let (video_stream, audio_stream) = self.stream_urls(video_url).await?;

        info!(
            "extracting [{} + {}] from {} to {}",
            range.to_ffmpeg_ss(),
            range.to_ffmpeg_t(),
            video_url,
            output_path.display()
        );

        let seek = range.to_ffmpeg_ss();
        let cmd = FfmpegCommand::new(output_path)
            .input_seeked(&seek, video_stream)
            .input_seeked(&seek, audio_stream)
            .duration(range.to_ffmpeg_t())
            .map("0:v")
            .map("1:a")
            .video_codec("libx264")
            .audio_codec("aac")
            .faststart();

        let mut runner = FfmpegRunner::new().with_timeout(Duration::from_secs(
            extraction_timeout_secs(range.duration_sec()),
        ));
        if let Some(cancel_rx) = &self.cancel_rx {
            runner = runner.with_cancel(cancel_rx.clone());
        }
        runner.run(&cmd).await?;

        if !is_valid_clip(output_path).await {
            return Err(MediaError::InvalidVideo(format!(
                "output file is invalid or incomplete: {}",
                output_path.display()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl MediaExtractor for YtdlpExtractor {
    async fn extract_clip(
        &self,
        video_url: &str,
        range: TimeRange,
        output_path: &Path,
    ) -> Result<(), ExtractionError> {
        Ok(self.extract(video_url, range, output_path).await?)
    }

    async fn concat_clips(
        &self,
        clip_paths: &[PathBuf],
        output_path: &Path,
    ) -> Result<bool, ExtractionError> {
        Ok(
            concat::concat_clips_with_cancel(clip_paths, output_path, self.cancel_rx.clone())
                .await?,
        )
    }
}
