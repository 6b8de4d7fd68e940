//! Search module
//!
//! Query options, the cached search service, and the search provider seam.

pub mod cached;
pub mod types;

pub use cached::CachedSearch;
pub use types::{HybridWeights, SearchMode, SearchOptions};
