//! Shared mock providers for pipeline integration tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use clipseek_models::{ProgressEvent, QueryVariants, Subtitle, SubtitleChunk, TimeRange, Video};
use clipseek_pipeline::{ClipSink, PipelineConfig, ProgressSink, SegmentPipeline, SubtitleSink};
use clipseek_providers::{
    ClipAnalysis, ExtractionError, MediaExtractor, RawSpan, SearchError, SearchProvider,
    SearchRequest, SegmentSummary, TextModel, TextModelError, TranscriptError, TranscriptProvider,
    VideoModel, VideoModelError,
};

pub fn video(id: &str, duration_sec: u32) -> Video {
    Video {
        video_id: id.to_string(),
        title: format!("title {}", id),
        channel: "channel".to_string(),
        duration_sec,
        published_at: Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(),
        thumbnail_url: String::new(),
    }
}

pub fn subtitle_for(video_id: &str) -> Subtitle {
    Subtitle {
        video_id: video_id.to_string(),
        language: "en".to_string(),
        is_auto_generated: false,
        chunks: vec![SubtitleChunk {
            start_sec: 0.0,
            end_sec: 5.0,
            text: format!("content about {}", video_id),
        }],
    }
}

pub fn span(start: f64, end: f64, confidence: f64, summary: &str) -> RawSpan {
    RawSpan {
        start_sec: start,
        end_sec: end,
        confidence,
        summary: summary.to_string(),
    }
}

/// Fast stagger and backoff so tests finish quickly.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        stagger_delay: Duration::from_millis(1),
        retry_delay: Duration::from_millis(1),
        ..Default::default()
    }
}

/// Pull the video id back out of the canonical watch URL.
fn id_from_url(url: &str) -> String {
    url.rsplit("v=").next().unwrap_or(url).to_string()
}

/// Pull the video id back out of a `clip_{id}_{index}.mp4` scratch path.
fn id_from_clip_path(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    stem.strip_prefix("clip_")
        .and_then(|rest| rest.rsplit_once('_'))
        .map(|(id, _)| id.to_string())
        .unwrap_or_else(|| stem.to_string())
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

pub struct MockSearch {
    videos: Vec<Video>,
    pub calls: AtomicU32,
}

impl MockSearch {
    pub fn new(videos: Vec<Video>) -> Self {
        Self {
            videos,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Video>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .videos
            .iter()
            .take(request.max_results)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Transcripts
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockTranscripts {
    /// Videos with captions. Anything absent here has none.
    tracks: HashMap<String, Subtitle>,
    /// Videos whose fetch fails with a network error.
    error_for: Vec<String>,
    pub calls: AtomicU32,
}

impl MockTranscripts {
    pub fn with_captions(video_ids: &[&str]) -> Self {
        Self {
            tracks: video_ids
                .iter()
                .map(|id| (id.to_string(), subtitle_for(id)))
                .collect(),
            error_for: Vec::new(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing_for(mut self, video_id: &str) -> Self {
        self.error_for.push(video_id.to_string());
        self
    }
}

#[async_trait]
impl TranscriptProvider for MockTranscripts {
    async fn fetch(
        &self,
        video_id: &str,
        _preferred_languages: &[String],
    ) -> Result<Option<Subtitle>, TranscriptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.error_for.iter().any(|id| id == video_id) {
            return Err(TranscriptError::Network("connection reset".to_string()));
        }
        Ok(self.tracks.get(video_id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Text model
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockTextModel {
    /// Variants returned by fan-out; `None` echoes the query.
    fan_out_response: Option<QueryVariants>,
    /// Spans returned when the subtitle excerpt contains the key.
    rank_responses: HashMap<String, Vec<RawSpan>>,
    /// Spans returned for URL-fallback analysis, keyed by video id.
    url_responses: HashMap<String, Vec<RawSpan>>,
}

impl MockTextModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fan_out(mut self, variants: QueryVariants) -> Self {
        self.fan_out_response = Some(variants);
        self
    }

    pub fn ranking(mut self, video_id: &str, spans: Vec<RawSpan>) -> Self {
        self.rank_responses.insert(video_id.to_string(), spans);
        self
    }

    pub fn url_analysis(mut self, video_id: &str, spans: Vec<RawSpan>) -> Self {
        self.url_responses.insert(video_id.to_string(), spans);
        self
    }
}

#[async_trait]
impl TextModel for MockTextModel {
    async fn fan_out(&self, user_query: &str) -> Result<QueryVariants, TextModelError> {
        Ok(self
            .fan_out_response
            .clone()
            .unwrap_or_else(|| QueryVariants::degenerate(user_query)))
    }

    async fn rank_subtitle(
        &self,
        _user_query: &str,
        subtitle_excerpt: &str,
    ) -> Result<Vec<RawSpan>, TextModelError> {
        for (needle, spans) in &self.rank_responses {
            if subtitle_excerpt.contains(needle) {
                return Ok(spans.clone());
            }
        }
        Ok(Vec::new())
    }

    async fn filter_titles(
        &self,
        _user_query: &str,
        titles: &[(String, String)],
        max_results: usize,
    ) -> Result<Vec<String>, TextModelError> {
        Ok(titles
            .iter()
            .take(max_results)
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn analyze_video_url(
        &self,
        _user_query: &str,
        video_url: &str,
    ) -> Result<Vec<RawSpan>, TextModelError> {
        Ok(self
            .url_responses
            .get(&id_from_url(video_url))
            .cloned()
            .unwrap_or_default())
    }

    async fn integrate_summary(
        &self,
        _user_query: &str,
        segment_summaries: &[SegmentSummary],
    ) -> Result<String, TextModelError> {
        Ok(format!("integrated ({})", segment_summaries.len()))
    }
}

// ---------------------------------------------------------------------------
// Video model
// ---------------------------------------------------------------------------

pub enum ClipBehavior {
    /// Return this analysis on the first attempt.
    Succeed(ClipAnalysis),
    /// Fail every attempt.
    AlwaysFail,
}

#[derive(Default)]
pub struct MockVideoModel {
    behaviors: HashMap<String, ClipBehavior>,
    /// Video ids in call order, one entry per attempt.
    pub calls: Mutex<Vec<String>>,
}

impl MockVideoModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refining(mut self, video_id: &str, relative: TimeRange, confidence: f64) -> Self {
        self.behaviors.insert(
            video_id.to_string(),
            ClipBehavior::Succeed(ClipAnalysis {
                start_sec: relative.start_sec(),
                end_sec: relative.end_sec(),
                confidence,
                summary: format!("refined {}", video_id),
            }),
        );
        self
    }

    pub fn failing(mut self, video_id: &str) -> Self {
        self.behaviors
            .insert(video_id.to_string(), ClipBehavior::AlwaysFail);
        self
    }

    pub fn attempts_for(&self, video_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|id| id.as_str() == video_id)
            .count()
    }
}

#[async_trait]
impl VideoModel for MockVideoModel {
    async fn analyze_clip(
        &self,
        clip_path: &Path,
        _user_query: &str,
    ) -> Result<ClipAnalysis, VideoModelError> {
        let video_id = id_from_clip_path(clip_path);
        self.calls.lock().unwrap().push(video_id.clone());

        match self.behaviors.get(&video_id) {
            Some(ClipBehavior::Succeed(analysis)) => Ok(analysis.clone()),
            Some(ClipBehavior::AlwaysFail) => {
                Err(VideoModelError::Api("rate limited".to_string()))
            }
            None => Err(VideoModelError::Api(format!(
                "no behavior configured for {}",
                video_id
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockExtractor {
    fail_for: Vec<String>,
    /// `(video_id, fetch_start, fetch_end)` per extraction call.
    pub calls: Mutex<Vec<(String, f64, f64)>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, video_id: &str) -> Self {
        self.fail_for.push(video_id.to_string());
        self
    }
}

#[async_trait]
impl MediaExtractor for MockExtractor {
    async fn extract_clip(
        &self,
        video_url: &str,
        range: TimeRange,
        output_path: &Path,
    ) -> Result<(), ExtractionError> {
        let video_id = id_from_url(video_url);
        self.calls
            .lock()
            .unwrap()
            .push((video_id.clone(), range.start_sec(), range.end_sec()));

        if self.fail_for.iter().any(|id| id == &video_id) {
            return Err(ExtractionError::Failed("byte range missing".to_string()));
        }

        std::fs::write(output_path, vec![0u8; 2048])
            .map_err(|e| ExtractionError::Failed(e.to_string()))?;
        Ok(())
    }

    async fn concat_clips(
        &self,
        _clip_paths: &[PathBuf],
        _output_path: &Path,
    ) -> Result<bool, ExtractionError> {
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingProgress(pub Mutex<Vec<ProgressEvent>>);

impl ProgressSink for RecordingProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

impl RecordingProgress {
    pub fn values(&self) -> Vec<f64> {
        self.0.lock().unwrap().iter().map(|e| e.progress).collect()
    }
}

#[derive(Default)]
pub struct RecordingClips(pub Mutex<Vec<String>>);

impl ClipSink for RecordingClips {
    fn on_clip(
        &self,
        video_id: &str,
        clip_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        assert!(clip_path.exists(), "clip must still exist when the sink runs");
        self.0.lock().unwrap().push(video_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSubtitles(pub Mutex<Vec<String>>);

impl SubtitleSink for RecordingSubtitles {
    fn on_subtitle(&self, video_id: &str, _subtitle: &Subtitle) {
        self.0.lock().unwrap().push(video_id.to_string());
    }
}

// ---------------------------------------------------------------------------
// Pipeline assembly
// ---------------------------------------------------------------------------

pub struct Fixture {
    pub search: Arc<MockSearch>,
    pub transcripts: Arc<MockTranscripts>,
    pub text_model: Arc<MockTextModel>,
    pub video_model: Arc<MockVideoModel>,
    pub extractor: Arc<MockExtractor>,
}

impl Fixture {
    pub fn pipeline(&self, config: PipelineConfig) -> SegmentPipeline {
        SegmentPipeline::new(
            self.search.clone(),
            self.transcripts.clone(),
            self.text_model.clone(),
            self.video_model.clone(),
            self.extractor.clone(),
            config,
        )
        .expect("valid test config")
    }
}
