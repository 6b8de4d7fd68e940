//! Error types for cache construction and configuration
//!
//! Cache reads and writes never fail. Everything in this module is raised
//! while building a cache or loading tier settings, so a bad configuration
//! stops the process at startup instead of surfacing mid-request.

use thiserror::Error;

/// Main error type for the caching layer
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid cache configuration (zero capacity, zero TTL, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// An environment variable override could not be applied
    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        var: String,
        value: String,
        reason: String,
    },

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for cache construction
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}
