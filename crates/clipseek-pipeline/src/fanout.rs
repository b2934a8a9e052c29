//! Query fan-out stage.

use tracing::{debug, warn};

use clipseek_models::{PipelinePhase, QueryVariants};
use clipseek_providers::TextModel;

use crate::progress::ProgressReporter;

/// Generate the three search-query variants for a user query.
///
/// A failing or unparseable model call degrades to all three variants
/// echoing the input and records a warning event, so the pipeline always
/// proceeds. The `original` variant echoes the input regardless of what
/// the model returned.
pub async fn generate_query_variants(
    text_model: &dyn TextModel,
    user_query: &str,
    reporter: &ProgressReporter,
) -> QueryVariants {
    match text_model.fan_out(user_query).await {
        Ok(mut variants) => {
            variants.original = user_query.to_string();
            debug!(
                "query variants: optimized={:?} simplified={:?}",
                variants.optimized, variants.simplified
            );
            variants
        }
        Err(e) => {
            warn!("query fan-out failed, searching with the original query: {}", e);
            reporter.emit(
                PipelinePhase::QueryFanOut,
                "query fan-out failed; searching with the original query",
                0.06,
            );
            QueryVariants::degenerate(user_query)
        }
    }
}
