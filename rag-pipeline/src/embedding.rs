//! Embedding generation read through the embedding tier

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::try_join_all;
use rag_cache::{CacheKey, CacheKeyBuilder, Embedding, TierKind, TtlCache};
use tracing::{debug, warn};

use crate::provider::EmbeddingProvider;

/// Embedding provider with an embedding-tier cache in front
pub struct CachedEmbedder<P> {
    provider: P,
    cache: Arc<TtlCache<Embedding>>,
    ttl: Option<Duration>,
}

impl<P: EmbeddingProvider> CachedEmbedder<P> {
    pub fn new(provider: P, cache: Arc<TtlCache<Embedding>>) -> Self {
        Self {
            provider,
            cache,
            ttl: None,
        }
    }

    /// Store embeddings with this TTL instead of the tier default
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Key for a text under the current model
    pub fn cache_key(&self, text: &str) -> CacheKey {
        CacheKeyBuilder::new(TierKind::Embedding.prefix())
            .param("model", self.provider.model())
            .param("text", text)
            .build()
    }

    /// Embed a single text, computing only on a cache miss
    ///
    /// A provider error is returned as-is and nothing is cached.
    pub async fn embed(&self, text: &str) -> Result<Embedding> {
        let key = self.cache_key(text);

        if let Some(embedding) = self.cache.get(&key) {
            return Ok(embedding);
        }

        debug!("Computing embedding with {}", self.provider.model());
        let embedding = self
            .provider
            .embed(text)
            .await
            .inspect_err(|e| warn!("Embedding failed: {}", e))?;

        self.cache.put(key, embedding.clone(), self.ttl);
        Ok(embedding)
    }

    /// Embed several texts, each read through the cache
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        try_join_all(texts.iter().map(|text| self.embed(text))).await
    }
}

#[cfg(feature = "fastembed")]
pub use local_model::FastEmbedProvider;

#[cfg(feature = "fastembed")]
mod local_model {
    use anyhow::{Context, Result};
    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use rag_cache::Embedding;
    use std::sync::Arc;
    use tracing::info;

    use crate::provider::EmbeddingProvider;

    /// Local ONNX embedding model via fastembed
    pub struct FastEmbedProvider {
        model: Arc<TextEmbedding>,
        model_name: String,
    }

    impl FastEmbedProvider {
        /// Create a provider with the multilingual E5 small model
        pub fn new() -> Result<Self> {
            Self::with_model(EmbeddingModel::MultilingualE5Small)
        }

        /// Create with a specific model
        pub fn with_model(model_name: EmbeddingModel) -> Result<Self> {
            info!("Initializing embedding model: {:?}", model_name);

            let label = format!("{:?}", model_name);
            let mut options = InitOptions::default();
            options.model_name = model_name;
            options.show_download_progress = true;

            let model = TextEmbedding::try_new(options)
                .context("Failed to initialize embedding model")?;

            Ok(Self {
                model: Arc::new(model),
                model_name: label,
            })
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FastEmbedProvider {
        fn model(&self) -> &str {
            &self.model_name
        }

        async fn embed(&self, text: &str) -> Result<Embedding> {
            let model = self.model.clone();
            let text = text.to_string();

            // Inference is CPU-bound; keep it off the async workers
            let embeddings = tokio::task::spawn_blocking(move || model.embed(vec![text], None))
                .await
                .context("Embedding task panicked")?
                .context("Failed to generate embedding")?;

            embeddings
                .into_iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("No embedding generated"))
        }
    }
}
