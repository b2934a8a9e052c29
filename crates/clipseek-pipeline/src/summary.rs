//! Integrated summary generation, run after the pipeline.

use tracing::warn;

use clipseek_models::VideoSegment;
use clipseek_providers::{SegmentSummary, TextModel};

/// Merge the per-segment summaries into one integrated answer.
///
/// A failing model call degrades to a bullet list of the per-segment
/// summaries; callers never receive an error here.
pub async fn integrated_summary(
    text_model: &dyn TextModel,
    user_query: &str,
    segments: &[VideoSegment],
) -> String {
    if segments.is_empty() {
        return "No matching segments were found.".to_string();
    }

    let summaries: Vec<SegmentSummary> = segments
        .iter()
        .map(|segment| SegmentSummary {
            video_title: segment.video.title.clone(),
            time_range: format!(
                "{:.1}s-{:.1}s",
                segment.time_range.start_sec(),
                segment.time_range.end_sec()
            ),
            summary: segment.summary.clone(),
        })
        .collect();

    match text_model.integrate_summary(user_query, &summaries).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!("integrated summary failed, falling back to bullet list: {}", e);
            summaries
                .iter()
                .map(|s| format!("- {}", s.summary))
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}
