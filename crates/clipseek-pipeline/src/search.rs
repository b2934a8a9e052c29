//! Multi-strategy search with deduplication.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::{info, warn};

use clipseek_models::Video;
use clipseek_providers::{SearchOrder, SearchProvider, SearchRequest};

use crate::cancel::CancelSignal;
use crate::config::PipelineConfig;
use crate::error::PipelineResult;

/// Days of history covered by the recency-restricted strategy.
const RECENT_WINDOW_DAYS: i64 = 30;

/// One `(ordering, recency-filter)` pair applied to each query.
#[derive(Debug, Clone, Copy)]
struct Strategy {
    name: &'static str,
    order: SearchOrder,
    recent_only: bool,
}

const STRATEGIES: [Strategy; 3] = [
    Strategy {
        name: "relevance",
        order: SearchOrder::Relevance,
        recent_only: false,
    },
    Strategy {
        name: "date",
        order: SearchOrder::Date,
        recent_only: false,
    },
    Strategy {
        name: "relevance_recent",
        order: SearchOrder::Relevance,
        recent_only: true,
    },
];

/// Deduplicated multi-strategy search output.
#[derive(Debug, Default)]
pub struct SearchOutcome {
    /// Videos in order of first discovery across the query x strategy
    /// matrix. Each `video_id` appears at most once.
    pub videos: Vec<Video>,
    /// Diagnostic result count per `(query, strategy)` call.
    pub stats: BTreeMap<String, usize>,
}

/// Run every strategy for every query, merging by video identity.
///
/// `started_at` is the pipeline-start instant; the recency strategy
/// restricts to the 30 days before it, computed once per run. A failing
/// strategy logs, counts zero results and does not abort the stage.
pub async fn multi_strategy_search(
    provider: &dyn SearchProvider,
    queries: &[&str],
    config: &PipelineConfig,
    started_at: DateTime<Utc>,
    cancel: &CancelSignal,
) -> PipelineResult<SearchOutcome> {
    let recent_cutoff = started_at - ChronoDuration::days(RECENT_WINDOW_DAYS);
    let per_call = config.max_results_per_strategy();

    let mut outcome = SearchOutcome::default();
    let mut seen: HashSet<String> = HashSet::new();

    for query in queries {
        for strategy in &STRATEGIES {
            cancel.check()?;

            let request = SearchRequest {
                query: (*query).to_string(),
                order: strategy.order,
                published_after: if strategy.recent_only {
                    Some(recent_cutoff)
                } else {
                    config.published_after
                },
                published_before: config.published_before,
                max_results: per_call,
                duration_min_sec: config.duration_min_sec,
                duration_max_sec: config.duration_max_sec,
            };

            let videos = match provider.search(&request).await {
                Ok(videos) => videos,
                Err(e) => {
                    warn!("search failed for {:?} ({}): {}", query, strategy.name, e);
                    Vec::new()
                }
            };

            outcome
                .stats
                .insert(format!("{}::{}", query, strategy.name), videos.len());

            for video in videos {
                if video.duration_sec < config.duration_min_sec
                    || video.duration_sec > config.duration_max_sec
                {
                    continue;
                }
                if seen.insert(video.video_id.clone()) {
                    outcome.videos.push(video);
                }
            }
        }
    }

    info!(
        "multi-strategy search found {} unique videos across {} calls",
        outcome.videos.len(),
        outcome.stats.len()
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use clipseek_providers::SearchError;
    use std::sync::Mutex;

    fn video(id: &str, duration_sec: u32) -> Video {
        Video {
            video_id: id.to_string(),
            title: format!("video {}", id),
            channel: "channel".to_string(),
            duration_sec,
            published_at: Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap(),
            thumbnail_url: String::new(),
        }
    }

    /// Replays canned responses, one per search call, recording requests.
    struct ScriptedProvider {
        responses: Mutex<Vec<Result<Vec<Video>, SearchError>>>,
        requests: Mutex<Vec<SearchRequest>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<Vec<Video>, SearchError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for ScriptedProvider {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<Video>, SearchError> {
            self.requests.lock().unwrap().push(request.clone());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                responses.remove(0)
            }
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[tokio::test]
    async fn test_dedup_keeps_first_occurrence() {
        // Video X shows up in four strategy results but must survive once,
        // at its first-discovery position.
        let provider = ScriptedProvider::new(vec![
            Ok(vec![video("a", 300), video("x", 300)]),
            Ok(vec![video("x", 300), video("b", 300)]),
            Ok(vec![video("x", 300)]),
            Ok(vec![video("x", 300), video("c", 300)]),
        ]);

        let outcome = multi_strategy_search(
            &provider,
            &["q1", "q2"],
            &config(),
            Utc::now(),
            &CancelSignal::never(),
        )
        .await
        .unwrap();

        let ids: Vec<&str> = outcome.videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "x", "b", "c"]);

        // One stat entry per (query, strategy) call.
        assert_eq!(outcome.stats.len(), 6);
        let total: usize = outcome.stats.values().sum();
        assert_eq!(total, 7);
    }

    #[tokio::test]
    async fn test_strategy_failure_counts_zero_and_continues() {
        let provider = ScriptedProvider::new(vec![
            Err(SearchError::Api("quota exceeded".to_string())),
            Ok(vec![video("a", 300)]),
            Ok(vec![video("b", 300)]),
        ]);

        let outcome = multi_strategy_search(
            &provider,
            &["q"],
            &config(),
            Utc::now(),
            &CancelSignal::never(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.videos.len(), 2);
        assert_eq!(outcome.stats["q::relevance"], 0);
        assert_eq!(outcome.stats["q::date"], 1);
    }

    #[tokio::test]
    async fn test_duration_filter_applies() {
        let provider = ScriptedProvider::new(vec![Ok(vec![
            video("short", 30),
            video("fits", 600),
            video("long", 10_000),
        ])]);

        let outcome = multi_strategy_search(
            &provider,
            &["q"],
            &config(),
            Utc::now(),
            &CancelSignal::never(),
        )
        .await
        .unwrap();

        let ids: Vec<&str> = outcome.videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["fits"]);
    }

    #[tokio::test]
    async fn test_recent_strategy_restricts_publication_window() {
        let provider = ScriptedProvider::new(Vec::new());
        let started_at = Utc.with_ymd_and_hms(2025, 7, 31, 0, 0, 0).unwrap();

        multi_strategy_search(
            &provider,
            &["q"],
            &config(),
            started_at,
            &CancelSignal::never(),
        )
        .await
        .unwrap();

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].published_after, None);
        assert_eq!(requests[1].published_after, None);
        assert_eq!(
            requests[2].published_after,
            Some(started_at - ChronoDuration::days(30))
        );

        // Each call asks for a third of the overall target.
        assert!(requests.iter().all(|r| r.max_results == 10));
    }

    #[tokio::test]
    async fn test_cancellation_stops_new_calls() {
        let provider = ScriptedProvider::new(Vec::new());
        let (handle, signal) = crate::cancel::cancel_pair();
        handle.cancel();

        let result =
            multi_strategy_search(&provider, &["q"], &config(), Utc::now(), &signal).await;
        assert!(result.is_err());
        assert!(provider.requests.lock().unwrap().is_empty());
    }
}
