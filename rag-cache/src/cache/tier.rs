//! Tier registry: one independently sized cache per consumer class
//!
//! The registry is built once by the process's composition root and handed
//! to consumers. There is no global instance.

use crate::cache::{
    clock::{Clock, SystemClock},
    config::TiersConfig,
    key::cache_key,
    payload::{Embedding, RagAnswer, ScoredChunk},
    store::TtlCache,
    types::{CacheKey, CacheStats},
};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// The consumer classes that get their own tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    /// Text embeddings
    Embedding,
    /// Hybrid search results
    Query,
    /// Synthesised answers
    RagAnswer,
}

impl TierKind {
    pub const ALL: [TierKind; 3] = [TierKind::Embedding, TierKind::Query, TierKind::RagAnswer];

    /// Key prefix reserved for this tier
    pub fn prefix(&self) -> &'static str {
        match self {
            TierKind::Embedding => "embedding",
            TierKind::Query => "query",
            TierKind::RagAnswer => "rag",
        }
    }

    /// Name fragment used in `RAG_CACHE_*` variables
    pub(crate) fn env_name(&self) -> &'static str {
        match self {
            TierKind::Embedding => "EMBEDDING",
            TierKind::Query => "QUERY",
            TierKind::RagAnswer => "RAG",
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            TierKind::Embedding => "embedding",
            TierKind::Query => "query",
            TierKind::RagAnswer => "rag_answer",
        })
    }
}

/// Statistics for one tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierStats {
    pub tier: TierKind,
    pub max_size: usize,
    pub stats: CacheStats,
}

/// The set of pipeline caches
pub struct CacheTiers {
    embedding: Arc<TtlCache<Embedding>>,
    query: Arc<TtlCache<Vec<ScoredChunk>>>,
    rag_answer: Arc<TtlCache<RagAnswer>>,
}

impl CacheTiers {
    /// Build every tier, failing fast on invalid settings
    pub fn new(config: &TiersConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build every tier against a shared time source
    pub fn with_clock(config: &TiersConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let tiers = Self {
            embedding: Arc::new(
                TtlCache::with_clock(config.embedding.clone(), clock.clone())?
                    .named(TierKind::Embedding.to_string()),
            ),
            query: Arc::new(
                TtlCache::with_clock(config.query.clone(), clock.clone())?
                    .named(TierKind::Query.to_string()),
            ),
            rag_answer: Arc::new(
                TtlCache::with_clock(config.rag_answer.clone(), clock)?
                    .named(TierKind::RagAnswer.to_string()),
            ),
        };

        info!(
            "Cache tiers ready (embedding: {}, query: {}, rag_answer: {})",
            config.embedding.max_size, config.query.max_size, config.rag_answer.max_size
        );
        Ok(tiers)
    }

    /// Embedding tier
    pub fn embedding(&self) -> Arc<TtlCache<Embedding>> {
        self.embedding.clone()
    }

    /// Query (search result) tier
    pub fn query(&self) -> Arc<TtlCache<Vec<ScoredChunk>>> {
        self.query.clone()
    }

    /// RAG-answer tier
    pub fn rag_answer(&self) -> Arc<TtlCache<RagAnswer>> {
        self.rag_answer.clone()
    }

    /// Derive a key inside a tier's namespace
    pub fn key<I, K, V>(kind: TierKind, params: I) -> CacheKey
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: fmt::Display,
    {
        cache_key(kind.prefix(), params)
    }

    /// Statistics for every tier
    pub fn stats(&self) -> Vec<TierStats> {
        vec![
            TierStats {
                tier: TierKind::Embedding,
                max_size: self.embedding.config().max_size,
                stats: self.embedding.stats(),
            },
            TierStats {
                tier: TierKind::Query,
                max_size: self.query.config().max_size,
                stats: self.query.stats(),
            },
            TierStats {
                tier: TierKind::RagAnswer,
                max_size: self.rag_answer.config().max_size,
                stats: self.rag_answer.stats(),
            },
        ]
    }

    /// Empty every tier
    pub fn clear_all(&self) {
        self.embedding.clear();
        self.query.clear();
        self.rag_answer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::config::CacheConfig;
    use crate::error::CacheError;
    use std::time::Duration;

    #[test]
    fn test_tier_kind_prefix_and_display() {
        assert_eq!(TierKind::Embedding.prefix(), "embedding");
        assert_eq!(TierKind::Query.prefix(), "query");
        assert_eq!(TierKind::RagAnswer.prefix(), "rag");
        assert_eq!(TierKind::RagAnswer.to_string(), "rag_answer");
    }

    #[test]
    fn test_default_tiers() {
        let tiers = CacheTiers::new(&TiersConfig::default()).unwrap();

        assert_eq!(tiers.embedding().config().max_size, 500);
        assert_eq!(
            tiers.embedding().config().default_ttl,
            Duration::from_secs(3600)
        );
        assert_eq!(tiers.query().config().max_size, 200);
        assert_eq!(tiers.query().config().default_ttl, Duration::from_secs(300));
        assert_eq!(tiers.rag_answer().config().max_size, 100);
        assert_eq!(
            tiers.rag_answer().config().default_ttl,
            Duration::from_secs(600)
        );
        assert_eq!(tiers.query().name(), "query");
    }

    #[test]
    fn test_invalid_tier_config_fails_fast() {
        let config = TiersConfig {
            query: CacheConfig::builder().max_size(0).build(),
            ..Default::default()
        };

        let err = CacheTiers::new(&config).err().unwrap();
        assert!(matches!(err, CacheError::Config(ref msg) if msg.contains("query")));
    }

    #[test]
    fn test_tiers_are_independent() {
        let tiers = CacheTiers::new(&TiersConfig::default()).unwrap();

        let key = CacheTiers::key(TierKind::Embedding, [("text", "x")]);
        tiers.embedding().set(key.clone(), vec![0.1, 0.2]);

        assert_eq!(tiers.embedding().len(), 1);
        assert!(tiers.query().is_empty());
        assert!(tiers.rag_answer().is_empty());
        assert_eq!(tiers.embedding().get(&key), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn test_handles_share_storage() {
        let tiers = CacheTiers::new(&TiersConfig::default()).unwrap();

        let writer = tiers.query();
        let reader = tiers.query();
        writer.set("query:q:x", Vec::new());

        assert!(reader.contains_key("query:q:x"));
    }

    #[test]
    fn test_stats_and_clear_all() {
        let tiers = CacheTiers::new(&TiersConfig::default()).unwrap();

        tiers.embedding().set("embedding:text:a", vec![1.0]);
        tiers.embedding().get("embedding:text:a");
        tiers.query().get("query:missing");

        let stats = tiers.stats();
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].tier, TierKind::Embedding);
        assert_eq!(stats[0].stats.hits, 1);
        assert_eq!(stats[0].stats.entries, 1);
        assert_eq!(stats[1].stats.misses, 1);
        assert_eq!(stats[2].max_size, 100);

        tiers.clear_all();
        assert!(tiers.embedding().is_empty());
    }
}
