//! # Tiered Caching Layer
//!
//! Bounded, TTL-based in-process caches that sit in front of the expensive
//! steps of a retrieval-augmented generation pipeline.
//!
//! ## Features
//!
//! - **Per-entry TTL**: lazy expiry, checked on read
//! - **Hard capacity**: FIFO eviction by insertion order once full
//! - **Deterministic keys**: order-independent, prefix-namespaced
//! - **Independent tiers**: embedding, query and RAG-answer caches with their own limits
//!
//! ## Example
//!
//! ```rust
//! use rag_cache::cache::{cache_key, CacheConfig, TtlCache};
//! use std::time::Duration;
//!
//! # fn example() -> rag_cache::Result<()> {
//! let config = CacheConfig::builder()
//!     .default_ttl(Duration::from_secs(300))
//!     .max_size(200)
//!     .build();
//!
//! let cache: TtlCache<String> = TtlCache::new(config)?;
//!
//! let key = cache_key("query", [("text", "what is a tier?"), ("limit", "5")]);
//! cache.set(key.clone(), "cached response".to_string());
//!
//! if let Some(value) = cache.get(&key) {
//!     println!("Cache hit: {}", value);
//! }
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod clock;
pub mod config;
pub mod entry;
pub mod key;
pub mod payload;
pub mod store;
pub mod tier;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheConfigBuilder, TiersConfig};
pub use entry::CacheEntry;
pub use key::{cache_key, CacheKeyBuilder};
pub use payload::{Embedding, RagAnswer, ScoredChunk, SearchSource};
pub use store::TtlCache;
pub use tier::{CacheTiers, TierKind, TierStats};
pub use types::{CacheKey, CacheStats};
