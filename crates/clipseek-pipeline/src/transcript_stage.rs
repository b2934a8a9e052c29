//! Transcript analysis stage.
//!
//! A bounded pool of five workers fetches captions and asks the text model
//! for relevant ranges. Caption-less videos fall back to direct URL
//! analysis when eligible. One worker's failure never poisons the pool; it
//! lands in the stage's diagnostic counters instead.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use clipseek_models::{Candidate, PipelinePhase, TimeRange, Video};
use clipseek_providers::{RawSpan, TextModel, TranscriptProvider};

use crate::cancel::CancelSignal;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::progress::ProgressReporter;
use crate::sinks::SubtitleSink;

/// Fixed transcript pool size.
const TRANSCRIPT_WORKERS: usize = 5;

/// Emit a progress event every this many completed tasks.
const PROGRESS_EVERY: usize = 10;

/// Up to this many candidates are taken per video.
const MAX_SPANS_PER_VIDEO: usize = 3;

/// Diagnostic counters for one stage run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TranscriptCounters {
    pub success: u32,
    pub no_match: u32,
    pub no_subtitle: u32,
    pub errors: u32,
}

enum TaskOutcome {
    Matched(Vec<Candidate>),
    NoMatch,
    NoSubtitle,
    Error,
}

#[derive(Default)]
struct StageState {
    counters: TranscriptCounters,
    completed: usize,
}

impl StageState {
    fn record(&mut self, outcome: &TaskOutcome) {
        match outcome {
            TaskOutcome::Matched(_) => self.counters.success += 1,
            TaskOutcome::NoMatch => self.counters.no_match += 1,
            TaskOutcome::NoSubtitle => self.counters.no_subtitle += 1,
            TaskOutcome::Error => self.counters.errors += 1,
        }
        self.completed += 1;
    }
}

/// Run the transcript stage over the filtered videos.
///
/// Returns candidates sorted by confidence descending and truncated to
/// `max_final_results`.
#[allow(clippy::too_many_arguments)]
pub async fn run_transcript_stage(
    transcripts: Arc<dyn TranscriptProvider>,
    text_model: Arc<dyn TextModel>,
    subtitle_sink: Option<Arc<dyn SubtitleSink>>,
    videos: Vec<Video>,
    user_query: &str,
    config: &PipelineConfig,
    reporter: &ProgressReporter,
    cancel: &CancelSignal,
) -> PipelineResult<Vec<Candidate>> {
    let total = videos.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let config = Arc::new(config.clone());
    let semaphore = Arc::new(Semaphore::new(TRANSCRIPT_WORKERS));
    let state = Arc::new(Mutex::new(StageState::default()));

    let mut handles = Vec::with_capacity(total);
    for (index, video) in videos.into_iter().enumerate() {
        let transcripts = Arc::clone(&transcripts);
        let text_model = Arc::clone(&text_model);
        let subtitle_sink = subtitle_sink.clone();
        let config = Arc::clone(&config);
        let semaphore = Arc::clone(&semaphore);
        let state = Arc::clone(&state);
        let reporter = reporter.clone();
        let cancel = cancel.clone();
        let user_query = user_query.to_string();

        handles.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (index, None),
            };
            if cancel.is_cancelled() {
                return (index, None);
            }

            let work = process_video(
                transcripts.as_ref(),
                text_model.as_ref(),
                subtitle_sink.as_deref(),
                &video,
                &user_query,
                &config,
                &cancel,
            );
            let outcome = match tokio::time::timeout(config.transcript_task_timeout, work).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("transcript task for {} timed out", video.video_id);
                    TaskOutcome::Error
                }
            };

            // Counters are updated under the mutex just before the
            // progress emission that reads them.
            let (completed, counters) = {
                let mut state = state.lock().expect("stage state lock poisoned");
                state.record(&outcome);
                (state.completed, state.counters)
            };
            if completed % PROGRESS_EVERY == 0 {
                reporter.emit_with_details(
                    PipelinePhase::TranscriptAnalysis,
                    format!("analyzed {}/{} videos", completed, total),
                    0.25 + 0.30 * (completed as f64 / total as f64),
                    serde_json::to_value(counters).unwrap_or(serde_json::Value::Null),
                );
            }

            (index, Some(outcome))
        }));
    }

    let mut per_video: Vec<Vec<Candidate>> = (0..total).map(|_| Vec::new()).collect();
    for handle in handles {
        match handle.await {
            Ok((index, Some(TaskOutcome::Matched(candidates)))) => per_video[index] = candidates,
            Ok(_) => {}
            Err(e) => warn!("transcript worker panicked: {}", e),
        }
    }

    cancel.check()?;

    let counters = state.lock().expect("stage state lock poisoned").counters;
    let mut candidates: Vec<Candidate> = per_video.into_iter().flatten().collect();
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    candidates.truncate(config.max_final_results);

    reporter.emit_with_details(
        PipelinePhase::TranscriptAnalysis,
        format!("transcript analysis complete, {} candidates", candidates.len()),
        0.55,
        serde_json::to_value(counters).unwrap_or(serde_json::Value::Null),
    );

    Ok(candidates)
}

async fn process_video(
    transcripts: &dyn TranscriptProvider,
    text_model: &dyn TextModel,
    subtitle_sink: Option<&dyn SubtitleSink>,
    video: &Video,
    user_query: &str,
    config: &PipelineConfig,
    cancel: &CancelSignal,
) -> TaskOutcome {
    match transcripts
        .fetch(&video.video_id, &config.preferred_languages)
        .await
    {
        Ok(Some(subtitle)) => {
            if let Some(sink) = subtitle_sink {
                sink.on_subtitle(&video.video_id, &subtitle);
            }

            let excerpt = subtitle.formatted_chunks();
            match text_model.rank_subtitle(user_query, &excerpt).await {
                Ok(spans) => {
                    let candidates = spans_to_candidates(spans, video, config.min_confidence);
                    if candidates.is_empty() {
                        TaskOutcome::NoMatch
                    } else {
                        TaskOutcome::Matched(candidates)
                    }
                }
                Err(e) => {
                    warn!("subtitle ranking failed for {}: {}", video.video_id, e);
                    TaskOutcome::Error
                }
            }
        }
        Ok(None) => url_fallback(text_model, video, user_query, config, cancel).await,
        Err(e) => {
            warn!("transcript fetch failed for {}: {}", video.video_id, e);
            TaskOutcome::Error
        }
    }
}

/// Analyze a caption-less video by handing its URL to the text model.
///
/// Gated on `enable_url_fallback` and the duration cap (inclusive).
/// Fallback errors are swallowed; the video simply contributes nothing.
async fn url_fallback(
    text_model: &dyn TextModel,
    video: &Video,
    user_query: &str,
    config: &PipelineConfig,
    cancel: &CancelSignal,
) -> TaskOutcome {
    if !config.enable_url_fallback || video.duration_sec > config.url_fallback_max_duration_sec {
        debug!(
            "no subtitle for {} and URL fallback not eligible ({}s)",
            video.video_id, video.duration_sec
        );
        return TaskOutcome::NoSubtitle;
    }
    if cancel.is_cancelled() {
        return TaskOutcome::NoSubtitle;
    }

    debug!("no subtitle for {}, analyzing video URL directly", video.video_id);
    match text_model.analyze_video_url(user_query, &video.url()).await {
        Ok(spans) => {
            let candidates = spans_to_candidates(spans, video, config.min_confidence);
            if candidates.is_empty() {
                TaskOutcome::NoSubtitle
            } else {
                TaskOutcome::Matched(candidates)
            }
        }
        Err(e) => {
            warn!("URL fallback failed for {}: {}", video.video_id, e);
            TaskOutcome::NoSubtitle
        }
    }
}

/// Validate raw model spans into candidates.
///
/// Spans with inverted or negative ranges are dropped, confidences are
/// clamped into `[0, 1]`, and anything below `min_confidence` is
/// discarded.
fn spans_to_candidates(spans: Vec<RawSpan>, video: &Video, min_confidence: f64) -> Vec<Candidate> {
    spans
        .into_iter()
        .filter_map(|span| {
            let time_range = match TimeRange::new(span.start_sec, span.end_sec) {
                Ok(range) => range,
                Err(e) => {
                    debug!("dropping invalid span for {}: {}", video.video_id, e);
                    return None;
                }
            };
            let confidence = span.confidence.clamp(0.0, 1.0);
            if confidence < min_confidence {
                return None;
            }
            Some(Candidate {
                video: video.clone(),
                time_range,
                confidence,
                summary: span.summary,
            })
        })
        .take(MAX_SPANS_PER_VIDEO)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn video(id: &str, duration_sec: u32) -> Video {
        Video {
            video_id: id.to_string(),
            title: format!("title {}", id),
            channel: "channel".to_string(),
            duration_sec,
            published_at: Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(),
            thumbnail_url: String::new(),
        }
    }

    fn span(start: f64, end: f64, confidence: f64) -> RawSpan {
        RawSpan {
            start_sec: start,
            end_sec: end,
            confidence,
            summary: "summary".to_string(),
        }
    }

    #[test]
    fn test_spans_below_min_confidence_are_dropped() {
        let candidates = spans_to_candidates(
            vec![span(0.0, 10.0, 0.9), span(20.0, 30.0, 0.25), span(40.0, 50.0, 0.7)],
            &video("v", 600),
            0.3,
        );
        let confidences: Vec<f64> = candidates.iter().map(|c| c.confidence).collect();
        assert_eq!(confidences, vec![0.9, 0.7]);
    }

    #[test]
    fn test_invalid_spans_are_dropped() {
        let candidates = spans_to_candidates(
            vec![span(30.0, 20.0, 0.9), span(-5.0, 10.0, 0.9), span(5.0, 5.0, 0.9)],
            &video("v", 600),
            0.0,
        );
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_confidence_is_clamped() {
        let candidates =
            spans_to_candidates(vec![span(0.0, 10.0, 1.7)], &video("v", 600), 0.3);
        assert_eq!(candidates[0].confidence, 1.0);
    }

    #[test]
    fn test_at_most_three_candidates_per_video() {
        let spans = (0..5).map(|i| span(i as f64 * 10.0, i as f64 * 10.0 + 5.0, 0.9)).collect();
        let candidates = spans_to_candidates(spans, &video("v", 600), 0.0);
        assert_eq!(candidates.len(), MAX_SPANS_PER_VIDEO);
    }
}
