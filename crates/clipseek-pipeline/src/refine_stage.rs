//! Video-model refinement stage.
//!
//! Each candidate becomes exactly one segment: refined when the clip
//! extraction and video-model call succeed, degraded otherwise. Admission
//! is staggered so the pool does not burst-hit the video model, and the
//! model call retries with linear backoff. Extraction failures are not
//! retried; they indicate a missing byte range.

use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tracing::warn;

use clipseek_models::{
    convert_relative_to_absolute, Candidate, PipelinePhase, TimeRange, VideoSegment,
};
use clipseek_providers::{MediaExtractor, VideoModel, VideoModelError};

use crate::cancel::CancelSignal;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::progress::ProgressReporter;
use crate::retry::{retry_linear, RetryOutcome, RetryPolicy};
use crate::sinks::ClipSink;

/// Maximum refinement pool size; the effective size is `min(3, tasks)`.
const REFINE_WORKERS: usize = 3;

struct RefineState {
    /// Output slots keyed by task index, so completion order never
    /// reorders the results.
    slots: Vec<Option<VideoSegment>>,
    completed: usize,
}

/// Refine every candidate through clip extraction and the video model.
///
/// Returns one segment per candidate, in candidate order.
#[allow(clippy::too_many_arguments)]
pub async fn run_refinement_stage(
    extractor: Arc<dyn MediaExtractor>,
    video_model: Arc<dyn VideoModel>,
    clip_sink: Option<Arc<dyn ClipSink>>,
    candidates: Vec<Candidate>,
    user_query: &str,
    config: &PipelineConfig,
    reporter: &ProgressReporter,
    cancel: &CancelSignal,
) -> PipelineResult<Vec<VideoSegment>> {
    let total = candidates.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let config = Arc::new(config.clone());
    let workers = REFINE_WORKERS.min(total);
    let semaphore = Arc::new(Semaphore::new(workers));
    let state = Arc::new(Mutex::new(RefineState {
        slots: (0..total).map(|_| None).collect(),
        completed: 0,
    }));

    let mut handles = Vec::with_capacity(total);
    for (index, candidate) in candidates.into_iter().enumerate() {
        let extractor = Arc::clone(&extractor);
        let video_model = Arc::clone(&video_model);
        let clip_sink = clip_sink.clone();
        let config = Arc::clone(&config);
        let semaphore = Arc::clone(&semaphore);
        let state = Arc::clone(&state);
        let reporter = reporter.clone();
        let cancel = cancel.clone();
        let user_query = user_query.to_string();

        handles.push(tokio::spawn(async move {
            // Staggered admission: task i delays its first attempt by
            // i * stagger_delay.
            if index > 0 {
                let stagger = config.stagger_delay * index as u32;
                if cancel.sleep(stagger).await.is_err() {
                    return;
                }
            }

            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            if cancel.is_cancelled() {
                return;
            }

            let segment = match refine_candidate(
                extractor.as_ref(),
                video_model.as_ref(),
                clip_sink.as_deref(),
                candidate,
                index,
                &user_query,
                &config,
                &cancel,
            )
            .await
            {
                Ok(segment) => segment,
                Err(_) => return,
            };

            let completed = {
                let mut state = state.lock().expect("refine state lock poisoned");
                state.slots[index] = Some(segment);
                state.completed += 1;
                state.completed
            };
            reporter.emit(
                PipelinePhase::Refinement,
                format!("refined {}/{} segments", completed, total),
                0.60 + 0.35 * (completed as f64 / total as f64),
            );
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            warn!("refinement worker panicked: {}", e);
        }
    }

    cancel.check()?;

    let slots = {
        let mut state = state.lock().expect("refine state lock poisoned");
        std::mem::take(&mut state.slots)
    };
    Ok(slots.into_iter().flatten().collect())
}

/// Refine one candidate. Always yields a segment unless cancelled.
#[allow(clippy::too_many_arguments)]
async fn refine_candidate(
    extractor: &dyn MediaExtractor,
    video_model: &dyn VideoModel,
    clip_sink: Option<&dyn ClipSink>,
    candidate: Candidate,
    index: usize,
    user_query: &str,
    config: &PipelineConfig,
    cancel: &CancelSignal,
) -> PipelineResult<VideoSegment> {
    let fetch_window = candidate.time_range.with_buffer(config.buffer_ratio);

    // Per-task scratch directory, removed on every exit path when dropped.
    let temp_dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            warn!(
                "failed to create temp dir for {}: {}",
                candidate.video.video_id, e
            );
            return Ok(VideoSegment::degraded(candidate));
        }
    };
    let clip_path = temp_dir
        .path()
        .join(format!("clip_{}_{}.mp4", candidate.video.video_id, index));

    cancel.check()?;
    if let Err(e) = extractor
        .extract_clip(&candidate.video.url(), fetch_window, &clip_path)
        .await
    {
        warn!(
            "clip extraction failed for {}: {}",
            candidate.video.video_id, e
        );
        return Ok(VideoSegment::degraded(candidate));
    }

    let policy = RetryPolicy {
        max_attempts: config.max_vlm_attempts,
        delay: config.retry_delay,
    };
    let outcome = retry_linear(&policy, cancel, "video model analysis", || async {
        let analysis = video_model.analyze_clip(&clip_path, user_query).await?;
        let relative = TimeRange::new(analysis.start_sec, analysis.end_sec)
            .map_err(|e| VideoModelError::Parse(format!("invalid relative range: {}", e)))?;
        Ok::<_, VideoModelError>((relative, analysis.confidence, analysis.summary))
    })
    .await?;

    let segment = match outcome {
        RetryOutcome::Success((relative, confidence, summary)) => {
            let absolute = convert_relative_to_absolute(fetch_window.start_sec(), relative);
            VideoSegment {
                video: candidate.video,
                time_range: absolute,
                summary,
                confidence: confidence.clamp(0.0, 1.0),
            }
        }
        RetryOutcome::Exhausted { error, attempts } => {
            warn!(
                "video model failed after {} attempts for {}: {}",
                attempts, candidate.video.video_id, error
            );
            VideoSegment::degraded(candidate)
        }
    };

    // Hand the clip to the sink before the temp dir goes away. Sink
    // failures are logged and swallowed.
    if let Some(sink) = clip_sink {
        if let Err(e) = sink.on_clip(&segment.video.video_id, &clip_path) {
            warn!("clip sink failed for {}: {}", segment.video.video_id, e);
        }
    }

    Ok(segment)
}
