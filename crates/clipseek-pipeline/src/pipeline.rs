//! The pipeline orchestrator.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::info;

use clipseek_models::{PipelinePhase, SearchResult, VideoSegment};
use clipseek_providers::{
    MediaExtractor, SearchProvider, TextModel, TranscriptProvider, VideoModel,
};

use crate::cancel::CancelSignal;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::fanout::generate_query_variants;
use crate::progress::ProgressReporter;
use crate::refine_stage::run_refinement_stage;
use crate::search::multi_strategy_search;
use crate::sinks::{ClipSink, ProgressSink, SubtitleSink};
use crate::title_filter::filter_by_title;
use crate::transcript_stage::run_transcript_stage;

/// How many videos the title filter lets through to transcript analysis.
const MAX_TITLE_FILTER_RESULTS: usize = 10;

/// The multi-stage extraction pipeline.
///
/// Stateless across runs; everything a run touches lives in per-run
/// locals. Providers are injected, sinks are optional.
pub struct SegmentPipeline {
    search: Arc<dyn SearchProvider>,
    transcripts: Arc<dyn TranscriptProvider>,
    text_model: Arc<dyn TextModel>,
    video_model: Arc<dyn VideoModel>,
    extractor: Arc<dyn MediaExtractor>,
    config: PipelineConfig,
    progress_sink: Option<Arc<dyn ProgressSink>>,
    clip_sink: Option<Arc<dyn ClipSink>>,
    subtitle_sink: Option<Arc<dyn SubtitleSink>>,
}

impl SegmentPipeline {
    /// Create a pipeline. Fails only on invalid configuration.
    pub fn new(
        search: Arc<dyn SearchProvider>,
        transcripts: Arc<dyn TranscriptProvider>,
        text_model: Arc<dyn TextModel>,
        video_model: Arc<dyn VideoModel>,
        extractor: Arc<dyn MediaExtractor>,
        config: PipelineConfig,
    ) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            search,
            transcripts,
            text_model,
            video_model,
            extractor,
            config,
            progress_sink: None,
            clip_sink: None,
            subtitle_sink: None,
        })
    }

    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress_sink = Some(sink);
        self
    }

    pub fn with_clip_sink(mut self, sink: Arc<dyn ClipSink>) -> Self {
        self.clip_sink = Some(sink);
        self
    }

    pub fn with_subtitle_sink(mut self, sink: Arc<dyn SubtitleSink>) -> Self {
        self.subtitle_sink = Some(sink);
        self
    }

    /// Run the pipeline for one query.
    ///
    /// Per-stage failures degrade internally and never escape; only
    /// cancellation does. A successful result may carry zero segments.
    pub async fn run(
        &self,
        user_query: &str,
        cancel: &CancelSignal,
    ) -> PipelineResult<SearchResult> {
        let started = Instant::now();
        let started_at = Utc::now();
        let reporter = ProgressReporter::new(self.progress_sink.clone());

        info!("pipeline run started for {:?}", user_query);

        // Phase 1: query fan-out.
        cancel.check()?;
        reporter.emit(PipelinePhase::QueryFanOut, "generating query variants", 0.05);
        let variants =
            generate_query_variants(self.text_model.as_ref(), user_query, &reporter).await;
        reporter.emit(PipelinePhase::QueryFanOut, "query variants ready", 0.08);

        // Phase 2: multi-strategy search with dedup.
        reporter.emit(PipelinePhase::Search, "searching videos", 0.10);
        let queries = variants.unique_queries();
        let outcome = multi_strategy_search(
            self.search.as_ref(),
            &queries,
            &self.config,
            started_at,
            cancel,
        )
        .await?;
        reporter.emit_with_details(
            PipelinePhase::Search,
            format!("found {} unique videos", outcome.videos.len()),
            0.20,
            serde_json::json!({ "search_stats": outcome.stats }),
        );

        if outcome.videos.is_empty() {
            return Ok(self.finish_empty(user_query, started, &reporter));
        }

        // Phase 3: title filter.
        cancel.check()?;
        reporter.emit(PipelinePhase::TitleFilter, "filtering by title", 0.22);
        let videos = filter_by_title(
            self.text_model.as_ref(),
            user_query,
            outcome.videos,
            MAX_TITLE_FILTER_RESULTS,
        )
        .await;
        reporter.emit(
            PipelinePhase::TitleFilter,
            format!("{} videos kept", videos.len()),
            0.24,
        );

        // Phase 4: transcript analysis.
        cancel.check()?;
        reporter.emit(
            PipelinePhase::TranscriptAnalysis,
            format!("analyzing {} transcripts", videos.len()),
            0.25,
        );
        let candidates = run_transcript_stage(
            Arc::clone(&self.transcripts),
            Arc::clone(&self.text_model),
            self.subtitle_sink.clone(),
            videos,
            user_query,
            &self.config,
            &reporter,
            cancel,
        )
        .await?;

        if candidates.is_empty() {
            return Ok(self.finish_empty(user_query, started, &reporter));
        }

        // Phase 5: refinement.
        let segments = if self.config.enable_vlm_refinement {
            reporter.emit(
                PipelinePhase::Refinement,
                format!("refining {} candidates", candidates.len()),
                0.60,
            );
            run_refinement_stage(
                Arc::clone(&self.extractor),
                Arc::clone(&self.video_model),
                self.clip_sink.clone(),
                candidates,
                user_query,
                &self.config,
                &reporter,
                cancel,
            )
            .await?
        } else {
            candidates
                .into_iter()
                .map(VideoSegment::from_candidate)
                .collect()
        };

        reporter.emit(PipelinePhase::Finalize, "done", 1.0);
        let processing_time_sec = started.elapsed().as_secs_f64();
        info!(
            "pipeline finished with {} segments in {:.1}s",
            segments.len(),
            processing_time_sec
        );

        Ok(SearchResult {
            query: user_query.to_string(),
            segments,
            processing_time_sec,
        })
    }

    /// Short-circuit on an empty intermediate: emit the terminal event and
    /// return an empty result.
    fn finish_empty(
        &self,
        user_query: &str,
        started: Instant,
        reporter: &ProgressReporter,
    ) -> SearchResult {
        info!("pipeline finished early with no results for {:?}", user_query);
        reporter.emit(PipelinePhase::Finalize, "no results", 1.0);
        SearchResult::empty(user_query, started.elapsed().as_secs_f64())
    }
}
