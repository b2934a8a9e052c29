//! Video search contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

use clipseek_models::Video;

use crate::error::SearchError;

/// Result ordering requested from the search API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    Relevance,
    Date,
}

impl SearchOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchOrder::Relevance => "relevance",
            SearchOrder::Date => "date",
        }
    }
}

/// Parameters for one search call.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub order: SearchOrder,
    /// Only return videos published at or after this instant.
    pub published_after: Option<DateTime<Utc>>,
    /// Only return videos published at or before this instant.
    pub published_before: Option<DateTime<Utc>>,
    /// Maximum number of items to return.
    pub max_results: usize,
    /// Inclusive video-duration filter, in seconds.
    pub duration_min_sec: u32,
    pub duration_max_sec: u32,
}

/// Video search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search call.
    ///
    /// Returns at most `max_results` items, already filtered by the
    /// duration bounds. Implementations parse video durations from the
    /// API's ISO-8601 period expression with
    /// [`parse_iso8601_duration`]; an unparseable duration counts as zero
    /// and falls out of the filter.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Video>, SearchError>;
}

/// Parse an ISO-8601 period expression (`PT1H2M3S`) into seconds.
///
/// Returns zero when the expression does not match, which downstream
/// duration filters treat as "filter out".
pub fn parse_iso8601_duration(period: &str) -> u32 {
    static PERIOD_RE: OnceLock<Regex> = OnceLock::new();
    let re = PERIOD_RE
        .get_or_init(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("valid regex"));

    let Some(caps) = re.captures(period) else {
        return 0;
    };
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(0)
    };
    part(1) * 3600 + part(2) * 60 + part(3)
}
