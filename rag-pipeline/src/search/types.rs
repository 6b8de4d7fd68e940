//! Common types for search module

use rag_cache::{CacheKeyBuilder, TierKind};
use serde::{Deserialize, Serialize};

/// Search engine mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Keyword search only
    KeywordOnly,
    /// Vector search only
    VectorOnly,
    /// Vector and keyword scores fused
    #[default]
    Hybrid,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeywordOnly => "keyword",
            Self::VectorOnly => "vector",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Weights used to fuse vector and keyword scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridWeights {
    /// Weight for vector similarity (0.0 - 1.0)
    pub vector: f32,
    /// Weight for keyword score (0.0 - 1.0)
    pub keyword: f32,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            vector: 0.5,
            keyword: 0.5,
        }
    }
}

/// Search query options
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Maximum number of results
    pub limit: usize,
    /// Minimum final score threshold
    pub min_score: Option<f32>,
    /// Which legs of the search run
    pub mode: SearchMode,
    /// Fusion weights for hybrid mode
    pub weights: HybridWeights,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self {
            limit: 10,
            min_score: None,
            mode: SearchMode::Hybrid,
            weights: HybridWeights::default(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_weights(mut self, vector: f32, keyword: f32) -> Self {
        self.weights = HybridWeights { vector, keyword };
        self
    }

    /// Key parameters for everything that changes the result list
    pub(crate) fn key_builder(&self, tier: TierKind) -> CacheKeyBuilder {
        CacheKeyBuilder::new(tier.prefix())
            .param("limit", self.limit)
            .param_opt("min_score", self.min_score)
            .param("mode", self.mode.as_str())
            .param("vector_weight", self.weights.vector)
            .param("keyword_weight", self.weights.keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SearchOptions::new();
        assert_eq!(options.limit, 10);
        assert_eq!(options.mode, SearchMode::Hybrid);
        assert_eq!(options.weights, HybridWeights::default());
        assert_eq!(options, SearchOptions::default());
    }

    #[test]
    fn test_key_reflects_every_option() {
        let base = SearchOptions::new();
        let key = |o: &SearchOptions| o.key_builder(TierKind::Query).build();

        let variants = [
            base.clone().with_limit(5),
            base.clone().with_min_score(0.3),
            base.clone().with_mode(SearchMode::VectorOnly),
            base.clone().with_weights(0.7, 0.3),
        ];

        for variant in &variants {
            assert_ne!(key(&base), key(variant));
        }
        assert_eq!(
            key(&base),
            "query:keyword_weight:0.5|limit:10|mode:hybrid|vector_weight:0.5"
        );
    }
}
