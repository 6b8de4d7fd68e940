//! End-to-end question answering over the three cache tiers

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rag_cache::{CacheKey, CacheTiers, RagAnswer, TierKind, TtlCache};
use tracing::{debug, info, warn};

use crate::embedding::CachedEmbedder;
use crate::provider::{AnswerProvider, EmbeddingProvider, SearchProvider};
use crate::search::{CachedSearch, SearchOptions};

/// Embed, retrieve and answer, with a cache in front of every step
///
/// The answer tier is probed first; a hit skips embedding and search
/// entirely.
pub struct RagPipeline<E, S, A> {
    embedder: CachedEmbedder<E>,
    search: CachedSearch<S>,
    answerer: A,
    answers: Arc<TtlCache<RagAnswer>>,
    answer_ttl: Option<Duration>,
}

impl<E, S, A> RagPipeline<E, S, A>
where
    E: EmbeddingProvider,
    S: SearchProvider,
    A: AnswerProvider,
{
    /// Wire providers to the tiers they read through
    pub fn new(tiers: &CacheTiers, embedder: E, search: S, answerer: A) -> Self {
        let search = CachedSearch::new(search, embedder.model(), tiers.query());
        Self {
            embedder: CachedEmbedder::new(embedder, tiers.embedding()),
            search,
            answerer,
            answers: tiers.rag_answer(),
            answer_ttl: None,
        }
    }

    /// Store answers with this TTL instead of the tier default
    pub fn with_answer_ttl(mut self, ttl: Duration) -> Self {
        self.answer_ttl = Some(ttl);
        self
    }

    pub fn embedder(&self) -> &CachedEmbedder<E> {
        &self.embedder
    }

    pub fn search(&self) -> &CachedSearch<S> {
        &self.search
    }

    pub fn answerer(&self) -> &A {
        &self.answerer
    }

    /// Key for a question under the given retrieval options
    pub fn answer_key(&self, question: &str, options: &SearchOptions) -> CacheKey {
        options
            .key_builder(TierKind::RagAnswer)
            .param("model", self.answerer.model())
            .param("embedding_model", self.embedder.provider().model())
            .param("question", question)
            .build()
    }

    /// Answer a question
    ///
    /// Failures at any step propagate; only complete answers are cached.
    pub async fn ask(&self, question: &str, options: &SearchOptions) -> Result<RagAnswer> {
        let key = self.answer_key(question, options);

        if let Some(answer) = self.answers.get(&key) {
            debug!("Serving cached answer for '{}'", question);
            return Ok(answer);
        }

        let embedding = self.embedder.embed(question).await?;
        let context = self.search.search(question, &embedding, options).await?;

        info!(
            "Synthesising answer for '{}' from {} chunks",
            question,
            context.len()
        );
        let answer = self
            .answerer
            .answer(question, &context)
            .await
            .inspect_err(|e| warn!("Answer synthesis failed for '{}': {}", question, e))?;

        self.answers.put(key, answer.clone(), self.answer_ttl);
        Ok(answer)
    }
}
