//! Pipeline configuration.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

/// Pipeline configuration.
///
/// A plain value passed into the pipeline; validated once before a run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Total search-result target across queries and strategies. Each
    /// strategy call requests a third of this.
    pub max_search_results: usize,
    /// Top-K candidates retained after the transcript stage.
    pub max_final_results: usize,
    /// Symmetric expansion of a candidate range before extraction.
    pub buffer_ratio: f64,
    /// Candidates below this confidence are dropped.
    pub min_confidence: f64,
    /// When false, skip refinement and use candidate ranges verbatim.
    pub enable_vlm_refinement: bool,
    /// Inclusive video-duration search filter, seconds.
    pub duration_min_sec: u32,
    pub duration_max_sec: u32,
    /// Whether caption-less videos may be analyzed via their URL.
    pub enable_url_fallback: bool,
    /// Maximum video duration eligible for URL fallback, inclusive, seconds.
    pub url_fallback_max_duration_sec: u32,
    /// Default search window bounds.
    pub published_after: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
    /// Caption languages tried in order.
    pub preferred_languages: Vec<String>,
    /// Admission stagger between refinement tasks.
    pub stagger_delay: Duration,
    /// Base delay for the linear video-model retry backoff.
    pub retry_delay: Duration,
    /// Video-model attempts per clip, including the first.
    pub max_vlm_attempts: u32,
    /// Wall-clock timeout per transcript task. Generous enough to cover
    /// the URL-fallback model call.
    pub transcript_task_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_search_results: 30,
            max_final_results: 5,
            buffer_ratio: 0.2,
            min_confidence: 0.3,
            enable_vlm_refinement: true,
            duration_min_sec: 60,
            duration_max_sec: 7200,
            enable_url_fallback: true,
            url_fallback_max_duration_sec: 1200,
            published_after: None,
            published_before: None,
            preferred_languages: vec!["ja".to_string(), "en".to_string()],
            stagger_delay: Duration::from_secs(3),
            retry_delay: Duration::from_secs(2),
            max_vlm_attempts: 3,
            transcript_task_timeout: Duration::from_secs(120),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_search_results: env_parse("CLIPSEEK_MAX_SEARCH_RESULTS", defaults.max_search_results),
            max_final_results: env_parse("CLIPSEEK_MAX_FINAL_RESULTS", defaults.max_final_results),
            buffer_ratio: env_parse("CLIPSEEK_BUFFER_RATIO", defaults.buffer_ratio),
            min_confidence: env_parse("CLIPSEEK_MIN_CONFIDENCE", defaults.min_confidence),
            enable_vlm_refinement: env_parse(
                "CLIPSEEK_ENABLE_VLM_REFINEMENT",
                defaults.enable_vlm_refinement,
            ),
            duration_min_sec: env_parse("CLIPSEEK_DURATION_MIN_SEC", defaults.duration_min_sec),
            duration_max_sec: env_parse("CLIPSEEK_DURATION_MAX_SEC", defaults.duration_max_sec),
            enable_url_fallback: env_parse(
                "CLIPSEEK_ENABLE_URL_FALLBACK",
                defaults.enable_url_fallback,
            ),
            url_fallback_max_duration_sec: env_parse(
                "CLIPSEEK_URL_FALLBACK_MAX_DURATION_SEC",
                defaults.url_fallback_max_duration_sec,
            ),
            published_after: env_datetime("CLIPSEEK_PUBLISHED_AFTER"),
            published_before: env_datetime("CLIPSEEK_PUBLISHED_BEFORE"),
            preferred_languages: std::env::var("CLIPSEEK_PREFERRED_LANGUAGES")
                .ok()
                .map(|s| s.split(',').map(|l| l.trim().to_string()).collect())
                .unwrap_or(defaults.preferred_languages),
            stagger_delay: Duration::from_secs(env_parse("CLIPSEEK_STAGGER_DELAY_SECS", 3)),
            retry_delay: Duration::from_secs(env_parse("CLIPSEEK_RETRY_DELAY_SECS", 2)),
            max_vlm_attempts: env_parse("CLIPSEEK_MAX_VLM_ATTEMPTS", defaults.max_vlm_attempts),
            transcript_task_timeout: Duration::from_secs(env_parse(
                "CLIPSEEK_TRANSCRIPT_TASK_TIMEOUT_SECS",
                120,
            )),
        }
    }

    /// Validate the configuration. The only fatal, pre-run error class.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_search_results < 3 {
            return Err(PipelineError::config(
                "max_search_results must be at least 3 (one per strategy)",
            ));
        }
        if self.max_final_results == 0 {
            return Err(PipelineError::config("max_final_results must be positive"));
        }
        if !(0.0..=1.0).contains(&self.buffer_ratio) {
            return Err(PipelineError::config("buffer_ratio must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(PipelineError::config("min_confidence must be within [0, 1]"));
        }
        if self.duration_min_sec > self.duration_max_sec {
            return Err(PipelineError::config(
                "duration_min_sec must not exceed duration_max_sec",
            ));
        }
        if let (Some(after), Some(before)) = (self.published_after, self.published_before) {
            if after >= before {
                return Err(PipelineError::config(
                    "published_after must precede published_before",
                ));
            }
        }
        if self.max_vlm_attempts == 0 {
            return Err(PipelineError::config("max_vlm_attempts must be positive"));
        }
        if self.preferred_languages.is_empty() {
            return Err(PipelineError::config(
                "preferred_languages must not be empty",
            ));
        }
        Ok(())
    }

    /// Result count requested from one search strategy call.
    pub fn max_results_per_strategy(&self) -> usize {
        self.max_search_results / 3
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_datetime(name: &str) -> Option<DateTime<Utc>> {
    std::env::var(name)
        .ok()
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
