//! # RAG Cache (rag-cache)
//!
//! In-process caches for a retrieval-augmented generation pipeline.
//!
//! ## Features
//!
//! - Generic bounded TTL cache (`TtlCache<V>`) with FIFO eviction
//! - Deterministic, order-independent cache key derivation
//! - Three independently sized tiers: embeddings, search results, answers
//! - Tier settings from defaults, `.env` and `RAG_CACHE_*` variables
//! - Fail-fast validation at construction; cache operations never fail
//!
//! ## Read-through usage
//!
//! A consumer derives a key, probes its tier, and only computes on a miss:
//!
//! ```
//! use rag_cache::{CacheTiers, TierKind, TiersConfig};
//!
//! fn embed_uncached(text: &str) -> Vec<f32> {
//!     vec![text.len() as f32]
//! }
//!
//! fn main() -> rag_cache::Result<()> {
//!     let tiers = CacheTiers::new(&TiersConfig::default())?;
//!     let embeddings = tiers.embedding();
//!
//!     let text = "hello world";
//!     let key = CacheTiers::key(TierKind::Embedding, [("text", text)]);
//!
//!     let vector = match embeddings.get(&key) {
//!         Some(hit) => hit,
//!         None => {
//!             let computed = embed_uncached(text);
//!             embeddings.set(key.clone(), computed.clone());
//!             computed
//!         }
//!     };
//!
//!     assert_eq!(embeddings.get(&key), Some(vector));
//!     Ok(())
//! }
//! ```
//!
//! ## Tier defaults
//!
//! | tier | capacity | default TTL | key prefix |
//! |---|---|---|---|
//! | embedding | 500 | 1h | `embedding` |
//! | query | 200 | 5m | `query` |
//! | rag-answer | 100 | 10m | `rag` |

pub mod cache;
pub mod error;

// Re-export main types for convenience
pub use cache::{
    cache_key, CacheConfig, CacheConfigBuilder, CacheEntry, CacheKey, CacheKeyBuilder,
    CacheStats, CacheTiers, Clock, Embedding, ManualClock, RagAnswer, ScoredChunk, SearchSource,
    SystemClock, TierKind, TierStats, TiersConfig, TtlCache,
};
pub use error::{CacheError, Result};
