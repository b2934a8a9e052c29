//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// One input source with its pre-`-i` arguments.
#[derive(Debug, Clone)]
struct Input {
    args: Vec<String>,
    source: String,
}

/// Builder for FFmpeg invocations.
///
/// Supports multiple inputs because byte-range extraction feeds separate
/// video and audio stream URLs, each with its own seek position.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<Input>,
    output: PathBuf,
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add a plain input.
    pub fn input(mut self, source: impl Into<String>) -> Self {
        self.inputs.push(Input {
            args: Vec::new(),
            source: source.into(),
        });
        self
    }

    /// Add an input with a `-ss` seek applied before it. Seeking before
    /// the input makes ffmpeg issue a range request instead of reading the
    /// stream from the beginning.
    pub fn input_seeked(mut self, seek: impl Into<String>, source: impl Into<String>) -> Self {
        self.inputs.push(Input {
            args: vec!["-ss".to_string(), seek.into()],
            source: source.into(),
        });
        self
    }

    /// Add a concat-demuxer manifest as the input.
    pub fn concat_input(mut self, list_file: impl AsRef<Path>) -> Self {
        self.inputs.push(Input {
            args: vec![
                "-f".to_string(),
                "concat".to_string(),
                "-safe".to_string(),
                "0".to_string(),
            ],
            source: list_file.as_ref().to_string_lossy().to_string(),
        });
        self
    }

    /// Add an output argument (after the inputs).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Limit the output duration (`-t`).
    pub fn duration(self, duration: impl Into<String>) -> Self {
        self.output_arg("-t").output_arg(duration)
    }

    /// Add a stream mapping (`-map`).
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    /// Set the video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set the audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Copy all streams without re-encoding.
    pub fn stream_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Optimize the container for streaming playback.
    pub fn faststart(self) -> Self {
        self.output_arg("-movflags").output_arg("+faststart")
    }

    /// Build the full argument list.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.source.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with timeout and cancellation.
pub struct FfmpegRunner {
    cancel_rx: Option<watch::Receiver<bool>>,
    timeout: Option<Duration>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self {
            cancel_rx: None,
            timeout: None,
        }
    }

    /// Set the cancellation signal. A signalled runner kills the
    /// subprocess and returns `MediaError::Cancelled`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set the subprocess timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("running ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stderr = child.stderr.take().expect("stderr not captured");
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let result = self.wait_for_completion(&mut child).await;

        // Timeout and cancellation leave the process running; kill it
        // before surfacing the error.
        if matches!(result, Err(MediaError::Timeout(_)) | Err(MediaError::Cancelled)) {
            let _ = child.kill().await;
        }

        let stderr_output = stderr_task.await.unwrap_or_default();

        let status = result?;
        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "ffmpeg exited with non-zero status",
                Some(tail_lines(&stderr_output, 10)),
                status.code(),
            ))
        }
    }

    /// Wait for the child, racing the timeout and the cancellation signal.
    async fn wait_for_completion(
        &self,
        child: &mut Child,
    ) -> MediaResult<std::process::ExitStatus> {
        let wait = self.wait_or_cancel(child);

        match self.timeout {
            Some(duration) => match tokio::time::timeout(duration, wait).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        "ffmpeg timed out after {} seconds, killing process",
                        duration.as_secs()
                    );
                    Err(MediaError::Timeout(duration.as_secs()))
                }
            },
            None => wait.await,
        }
    }

    async fn wait_or_cancel(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        match self.cancel_rx.clone() {
            Some(mut cancel_rx) => {
                tokio::select! {
                    status = child.wait() => Ok(status?),
                    _ = cancelled(&mut cancel_rx) => {
                        warn!("ffmpeg cancelled, killing process");
                        Err(MediaError::Cancelled)
                    }
                }
            }
            None => Ok(child.wait().await?),
        }
    }
}

/// Resolve once the cancellation flag flips to true. Never resolves when
/// the sender is gone without having signalled.
async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    while !*cancel_rx.borrow() {
        if cancel_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Last `n` lines of subprocess stderr, enough context for error reports
/// without dumping megabytes into logs.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
