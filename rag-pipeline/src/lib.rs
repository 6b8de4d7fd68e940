//! Read-through caching for a retrieval-augmented generation pipeline.
//!
//! Each expensive step (embedding, hybrid search, answer synthesis) is a
//! provider trait. A `Cached*` wrapper puts the matching `rag-cache` tier in
//! front of it: derive key, probe tier, compute on miss, store.

pub mod embedding;
pub mod local;
pub mod pipeline;
pub mod provider;
pub mod search;

pub use embedding::CachedEmbedder;
pub use local::{ExtractiveAnswerer, HashingEmbedder, InMemorySearch};
pub use pipeline::RagPipeline;
pub use provider::{AnswerProvider, EmbeddingProvider, SearchProvider};
pub use search::{CachedSearch, HybridWeights, SearchMode, SearchOptions};
