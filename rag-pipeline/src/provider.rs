//! Expensive operations that sit behind the cache tiers
//!
//! Implementations do the real work (model inference, index lookups, LLM
//! calls). They know nothing about caching; the `Cached*` services wrap them.

use anyhow::Result;
use async_trait::async_trait;
use rag_cache::{Embedding, RagAnswer, ScoredChunk};

use crate::search::SearchOptions;

/// Turns text into a vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier, part of every embedding cache key
    fn model(&self) -> &str;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Embedding>;
}

/// Ranked retrieval over the knowledge base
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        query_embedding: &[f32],
        options: &SearchOptions,
    ) -> Result<Vec<ScoredChunk>>;
}

/// Answer synthesis over retrieved context
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Model identifier, part of every answer cache key
    fn model(&self) -> &str;

    async fn answer(&self, question: &str, context: &[ScoredChunk]) -> Result<RagAnswer>;
}
