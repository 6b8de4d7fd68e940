//! Search results read through the query tier

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rag_cache::{CacheKey, ScoredChunk, TierKind, TtlCache};
use tracing::{debug, warn};

use super::types::SearchOptions;
use crate::provider::SearchProvider;

/// Hybrid search with a query-tier cache in front
///
/// Query embeddings are produced by `embedding_model`, which is part of every
/// key so that searches fed by different embedders never share results.
pub struct CachedSearch<P> {
    provider: P,
    embedding_model: String,
    cache: Arc<TtlCache<Vec<ScoredChunk>>>,
    ttl: Option<Duration>,
}

impl<P: SearchProvider> CachedSearch<P> {
    pub fn new(
        provider: P,
        embedding_model: impl Into<String>,
        cache: Arc<TtlCache<Vec<ScoredChunk>>>,
    ) -> Self {
        Self {
            provider,
            embedding_model: embedding_model.into(),
            cache,
            ttl: None,
        }
    }

    /// Store results with this TTL instead of the tier default
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Key for a query under the given options
    ///
    /// The embedding itself is determined by the query text and the
    /// embedding model, so only those two go into the key.
    pub fn cache_key(&self, query: &str, options: &SearchOptions) -> CacheKey {
        options
            .key_builder(TierKind::Query)
            .param("embedding_model", &self.embedding_model)
            .param("query", query)
            .build()
    }

    /// Run a search, serving repeated queries from cache
    pub async fn search(
        &self,
        query: &str,
        query_embedding: &[f32],
        options: &SearchOptions,
    ) -> Result<Vec<ScoredChunk>> {
        let key = self.cache_key(query, options);

        if let Some(results) = self.cache.get(&key) {
            debug!("Serving {} cached results for '{}'", results.len(), query);
            return Ok(results);
        }

        let results = self
            .provider
            .search(query, query_embedding, options)
            .await
            .inspect_err(|e| warn!("Search failed for '{}': {}", query, e))?;

        self.cache.put(key, results.clone(), self.ttl);
        Ok(results)
    }
}
