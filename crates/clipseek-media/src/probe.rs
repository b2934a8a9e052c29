//! Output container validation via ffprobe.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Minimum plausible clip size in bytes; anything smaller is a truncated
/// download.
const MIN_CLIP_SIZE_BYTES: u64 = 1024;

/// Probe subprocess timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Check that `path` contains a decodable video stream.
pub async fn has_video_stream(path: impl AsRef<Path>) -> MediaResult<bool> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_type",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();

    let output = tokio::time::timeout(PROBE_TIMEOUT, output)
        .await
        .map_err(|_| MediaError::Timeout(PROBE_TIMEOUT.as_secs()))??;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "ffprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).contains("video"))
}

/// Whether `path` is a usable clip: present, at least 1 KiB and probing to
/// a video stream. Probe failures count as invalid.
pub async fn is_valid_clip(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();

    let Ok(metadata) = tokio::fs::metadata(path).await else {
        return false;
    };
    if metadata.len() < MIN_CLIP_SIZE_BYTES {
        return false;
    }

    match has_video_stream(path).await {
        Ok(valid) => valid,
        Err(e) => {
            debug!("clip validation failed for {}: {}", path.display(), e);
            false
        }
    }
}
