//! Deterministic in-process providers
//!
//! No model download or network access. Used by the CLI self-check and by
//! tests; each provider counts how often it did real work.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use rag_cache::{Embedding, RagAnswer, ScoredChunk, SearchSource};

use crate::provider::{AnswerProvider, EmbeddingProvider, SearchProvider};
use crate::search::{SearchMode, SearchOptions};

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

/// Feature-hashing bag-of-words embedder
pub struct HashingEmbedder {
    dimension: usize,
    model: String,
    calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            model: format!("hashing-{}", dimension.max(1)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of embeddings actually computed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Embed without counting a call (used when indexing a corpus)
    pub fn embed_sync(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0_f32; self.dimension];
        for token in tokens(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.embed_sync(text))
    }
}

struct IndexedChunk {
    id: String,
    content: String,
    metadata: serde_json::Value,
    embedding: Embedding,
}

/// Brute-force vector + keyword search over an in-memory corpus
#[derive(Default)]
pub struct InMemorySearch {
    chunks: Vec<IndexedChunk>,
    calls: AtomicUsize,
}

impl InMemorySearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chunk with its precomputed embedding
    pub fn index(
        &mut self,
        id: impl Into<String>,
        content: impl Into<String>,
        metadata: serde_json::Value,
        embedding: Embedding,
    ) {
        self.chunks.push(IndexedChunk {
            id: id.into(),
            content: content.into(),
            metadata,
            embedding,
        });
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of searches actually executed
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn keyword_score(query_terms: &[String], content: &str) -> f32 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let content_terms: Vec<String> = tokens(content).collect();
        let matched = query_terms
            .iter()
            .filter(|term| content_terms.contains(term))
            .count();
        matched as f32 / query_terms.len() as f32
    }
}

#[async_trait]
impl SearchProvider for InMemorySearch {
    async fn search(
        &self,
        query: &str,
        query_embedding: &[f32],
        options: &SearchOptions,
    ) -> Result<Vec<ScoredChunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let query_terms: Vec<String> = tokens(query).collect();

        let mut results: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .filter_map(|chunk| {
                let similarity = cosine(query_embedding, &chunk.embedding).max(0.0);
                let keyword = Self::keyword_score(&query_terms, &chunk.content);

                let (final_score, keyword_score, source) = match options.mode {
                    SearchMode::VectorOnly => (similarity, None, SearchSource::Vector),
                    SearchMode::KeywordOnly => (keyword, Some(keyword), SearchSource::Keyword),
                    SearchMode::Hybrid => (
                        options.weights.vector * similarity + options.weights.keyword * keyword,
                        (keyword > 0.0).then_some(keyword),
                        SearchSource::Hybrid,
                    ),
                };

                if final_score <= 0.0 || options.min_score.is_some_and(|min| final_score < min) {
                    return None;
                }

                Some(ScoredChunk {
                    id: chunk.id.clone(),
                    content: chunk.content.clone(),
                    metadata: chunk.metadata.clone(),
                    similarity,
                    keyword_score,
                    final_score,
                    source,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.final_score
                .total_cmp(&a.final_score)
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(options.limit);
        Ok(results)
    }
}

/// Answers by quoting the best-ranked context chunks
pub struct ExtractiveAnswerer {
    model: String,
    max_sources: usize,
    calls: AtomicUsize,
}

impl ExtractiveAnswerer {
    pub fn new(max_sources: usize) -> Self {
        Self {
            model: "extractive".to_string(),
            max_sources: max_sources.max(1),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of answers actually synthesised
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerProvider for ExtractiveAnswerer {
    fn model(&self) -> &str {
        &self.model
    }

    async fn answer(&self, question: &str, context: &[ScoredChunk]) -> Result<RagAnswer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if question.trim().is_empty() {
            bail!("Cannot answer an empty question");
        }

        let sources: Vec<ScoredChunk> = context.iter().take(self.max_sources).cloned().collect();
        let answer = if sources.is_empty() {
            "No relevant context found.".to_string()
        } else {
            sources
                .iter()
                .map(|chunk| chunk.content.trim())
                .collect::<Vec<_>>()
                .join(" ")
        };

        Ok(RagAnswer {
            answer,
            sources,
            model: self.model.clone(),
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn corpus(embedder: &HashingEmbedder) -> InMemorySearch {
        let mut search = InMemorySearch::new();
        for (id, text) in [
            ("c1", "Embeddings are cached for one hour"),
            ("c2", "Query results are cached for five minutes"),
            ("c3", "Bananas are yellow"),
        ] {
            search.index(id, text, json!({"doc": id}), embedder.embed_sync(text));
        }
        search
    }

    #[test]
    fn test_hashing_embedder_is_deterministic_and_normalised() {
        let embedder = HashingEmbedder::new(32);
        let a = embedder.embed_sync("Cache tiers");
        let b = embedder.embed_sync("cache TIERS");

        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_in_memory_search_ranks_relevant_chunks_first() {
        let embedder = HashingEmbedder::new(64);
        let search = corpus(&embedder);
        let query = "how long are query results cached";

        let results = search
            .search(query, &embedder.embed_sync(query), &SearchOptions::new().with_limit(2))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "c2");
        assert!(results[0].final_score >= results[1].final_score);
        assert_eq!(results[0].source, SearchSource::Hybrid);
        assert_eq!(search.calls(), 1);
    }

    #[tokio::test]
    async fn test_keyword_only_mode() {
        let embedder = HashingEmbedder::new(64);
        let search = corpus(&embedder);

        let results = search
            .search(
                "bananas",
                &embedder.embed_sync("bananas"),
                &SearchOptions::new().with_mode(SearchMode::KeywordOnly),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "c3");
        assert_eq!(results[0].keyword_score, Some(1.0));
    }

    #[tokio::test]
    async fn test_extractive_answerer() {
        let answerer = ExtractiveAnswerer::new(1);
        let embedder = HashingEmbedder::new(64);
        let search = corpus(&embedder);
        let context = search
            .search("bananas", &embedder.embed_sync("bananas"), &SearchOptions::new())
            .await
            .unwrap();

        let answer = answerer.answer("what colour are bananas?", &context).await.unwrap();
        assert_eq!(answer.answer, "Bananas are yellow");
        assert_eq!(answer.sources.len(), 1);

        let empty = answerer.answer("anything?", &[]).await.unwrap();
        assert_eq!(empty.answer, "No relevant context found.");

        assert!(answerer.answer("   ", &context).await.is_err());
        assert_eq!(answerer.calls(), 3);
    }
}
