//! Title-level relevance filtering.

use std::collections::HashMap;

use tracing::{info, warn};

use clipseek_models::Video;
use clipseek_providers::TextModel;

/// Ask the text model which videos look relevant by title alone.
///
/// Returns the surviving videos in the model's order, truncated to
/// `max_results`, with ids the input does not contain silently dropped.
/// A failing model call degrades to the first `max_results` input videos,
/// and the same substitution applies when the model explicitly selects
/// nothing, so this stage never empties the pipeline by itself.
pub async fn filter_by_title(
    text_model: &dyn TextModel,
    user_query: &str,
    videos: Vec<Video>,
    max_results: usize,
) -> Vec<Video> {
    if videos.is_empty() {
        return videos;
    }

    let titles: Vec<(String, String)> = videos
        .iter()
        .map(|v| (v.video_id.clone(), v.title.clone()))
        .collect();

    let selected = match text_model
        .filter_titles(user_query, &titles, max_results)
        .await
    {
        Ok(ids) => ids,
        Err(e) => {
            warn!(
                "title filter failed, passing through first {} videos: {}",
                max_results, e
            );
            return videos.into_iter().take(max_results).collect();
        }
    };

    let input_order: Vec<String> = videos.iter().map(|v| v.video_id.clone()).collect();
    let mut by_id: HashMap<String, Video> = videos
        .into_iter()
        .map(|v| (v.video_id.clone(), v))
        .collect();

    let mut kept: Vec<Video> = Vec::new();
    for id in selected {
        if kept.len() == max_results {
            break;
        }
        if let Some(video) = by_id.remove(&id) {
            kept.push(video);
        }
    }

    if kept.is_empty() {
        info!(
            "title filter selected nothing; substituting first {} videos",
            max_results
        );
        return input_order
            .into_iter()
            .filter_map(|id| by_id.remove(&id))
            .take(max_results)
            .collect();
    }

    info!(
        "title filter kept {} of {} videos",
        kept.len(),
        input_order.len()
    );
    kept
}
