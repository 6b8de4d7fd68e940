//! Value types stored in the pipeline tiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Embedding vector, as produced by the embedding provider
pub type Embedding = Vec<f32>;

/// Search method that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSource {
    Vector,
    Keyword,
    Hybrid,
}

impl SearchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Keyword => "keyword",
            Self::Hybrid => "hybrid",
        }
    }
}

/// One ranked hit from hybrid search, cached in the query tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Chunk ID
    pub id: String,
    /// Chunk text
    pub content: String,
    /// Arbitrary metadata attached at indexing time
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Vector similarity (0.0 - 1.0)
    pub similarity: f32,
    /// Keyword (BM25) score, when the keyword leg matched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_score: Option<f32>,
    /// Fused score used for ranking
    pub final_score: f32,
    /// Search method that found this result
    pub source: SearchSource,
}

/// A synthesised answer, cached in the RAG-answer tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagAnswer {
    /// Generated answer text
    pub answer: String,
    /// Context chunks the answer was grounded on
    pub sources: Vec<ScoredChunk>,
    /// Model that produced the answer
    pub model: String,
    /// When the answer was generated
    pub generated_at: DateTime<Utc>,
}
