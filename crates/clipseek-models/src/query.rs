//! Search-query variants produced by the fan-out stage.

use serde::{Deserialize, Serialize};

/// The three query variants one pipeline run searches with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryVariants {
    /// The user's input, verbatim.
    pub original: String,
    /// Model-optimized query (5-7 tokens, domain terms).
    pub optimized: String,
    /// Core keywords only (2-4 tokens).
    pub simplified: String,
}

impl QueryVariants {
    /// Fallback when the fan-out model call fails: all three variants echo
    /// the original query so the pipeline can proceed.
    pub fn degenerate(query: &str) -> Self {
        Self {
            original: query.to_string(),
            optimized: query.to_string(),
            simplified: query.to_string(),
        }
    }

    /// Variants deduplicated, preserving first occurrence.
    pub fn unique_queries(&self) -> Vec<&str> {
        let mut queries: Vec<&str> = Vec::with_capacity(3);
        for query in [&self.original, &self.optimized, &self.simplified] {
            if !queries.contains(&query.as_str()) {
                queries.push(query);
            }
        }
        queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_echoes_input() {
        let variants = QueryVariants::degenerate("rust async");
        assert_eq!(variants.original, "rust async");
        assert_eq!(variants.optimized, "rust async");
        assert_eq!(variants.simplified, "rust async");
    }

    #[test]
    fn test_unique_queries_preserves_first_occurrence() {
        let variants = QueryVariants {
            original: "a".to_string(),
            optimized: "b".to_string(),
            simplified: "a".to_string(),
        };
        assert_eq!(variants.unique_queries(), vec!["a", "b"]);

        let degenerate = QueryVariants::degenerate("q");
        assert_eq!(degenerate.unique_queries(), vec!["q"]);
    }
}
