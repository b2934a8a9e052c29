//! Clip concatenation via the ffmpeg concat demuxer.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::is_valid_clip;

/// Timeout for the stream-copy path.
const CONCAT_COPY_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for the re-encode fallback.
const CONCAT_REENCODE_TIMEOUT: Duration = Duration::from_secs(600);

/// Concatenate clips into `output_path`.
///
/// Invalid inputs (missing, under 1 KiB or without a video stream) are
/// skipped. Returns `Ok(false)` when nothing survives validation. A single
/// surviving clip is copied. Two or more go through the concat demuxer
/// with stream copy; a non-zero ffmpeg exit (typically a codec mismatch
/// across inputs) triggers one re-encode retry with H.264/AAC/faststart.
pub async fn concat_clips(clip_paths: &[PathBuf], output_path: &Path) -> MediaResult<bool> {
    concat_clips_with_cancel(clip_paths, output_path, None).await
}

pub(crate) async fn concat_clips_with_cancel(
    clip_paths: &[PathBuf],
    output_path: &Path,
    cancel_rx: Option<watch::Receiver<bool>>,
) -> MediaResult<bool> {
    let mut valid = Vec::with_capacity(clip_paths.len());
    for path in clip_paths {
        if is_valid_clip(path).await {
            let absolute = tokio::fs::canonicalize(path)
                .await
                .unwrap_or_else(|_| path.clone());
            valid.push(absolute);
        } else {
            warn!("skipping invalid clip: {}", path.display());
        }
    }

    if valid.is_empty() {
        warn!("no valid clips to concatenate");
        return Ok(false);
    }

    if valid.len() == 1 {
        tokio::fs::copy(&valid[0], output_path).await?;
        info!("copied single clip to {}", output_path.display());
        return Ok(true);
    }

    info!(
        "concatenating {} clips into {}",
        valid.len(),
        output_path.display()
    );

    // The manifest is removed on every exit path, including panics, when
    // the NamedTempFile drops.
    let mut manifest = tempfile::Builder::new().suffix(".txt").tempfile()?;
    manifest.write_all(build_concat_manifest(&valid).as_bytes())?;
    manifest.flush()?;

    let copy_cmd = FfmpegCommand::new(output_path)
        .concat_input(manifest.path())
        .stream_copy();

    let mut runner = FfmpegRunner::new().with_timeout(CONCAT_COPY_TIMEOUT);
    if let Some(cancel_rx) = &cancel_rx {
        runner = runner.with_cancel(cancel_rx.clone());
    }

    match runner.run(&copy_cmd).await {
        Ok(()) => Ok(true),
        Err(MediaError::FfmpegFailed { .. }) => {
            warn!("concat stream copy failed, retrying with re-encode");

            let reencode_cmd = FfmpegCommand::new(output_path)
                .concat_input(manifest.path())
                .video_codec("libx264")
                .audio_codec("aac")
                .faststart();

            let mut runner = FfmpegRunner::new().with_timeout(CONCAT_REENCODE_TIMEOUT);
            if let Some(cancel_rx) = &cancel_rx {
                runner = runner.with_cancel(cancel_rx.clone());
            }
            runner.run(&reencode_cmd).await?;
            Ok(true)
        }
        Err(e) => Err(e),
    }
}

/// Render the concat demuxer manifest: one single-quoted absolute path per
/// line, with embedded single quotes escaped.
fn build_concat_manifest(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| {
            let escaped = path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}
