//! Configuration for cache tiers

use crate::cache::tier::TierKind;
use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Configuration for a single bounded TTL cache
///
/// Capacity is an entry count. Once reached, inserting a new key evicts the
/// oldest inserted entry first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries held at once
    pub max_size: usize,

    /// TTL applied when `set` is called without an override
    #[serde(with = "duration_ms")]
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1_000,
            // 1 hour default TTL
            default_ttl: Duration::from_secs(3600),
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::Config(
                "max_size must be greater than 0".to_string(),
            ));
        }

        if self.default_ttl.is_zero() {
            return Err(CacheError::Config(
                "default_ttl must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    max_size: Option<usize>,
    default_ttl: Option<Duration>,
}

impl CacheConfigBuilder {
    /// Set maximum number of cache entries
    pub fn max_size(mut self, max: usize) -> Self {
        self.max_size = Some(max);
        self
    }

    /// Set default TTL for cache entries
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Build the cache configuration
    ///
    /// Validation happens when the cache is constructed.
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            max_size: self.max_size.unwrap_or(defaults.max_size),
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
        }
    }
}

/// Preset configurations for the pipeline tiers
impl CacheConfig {
    /// Embeddings are stable for a given text: large and long-lived
    pub fn embedding() -> Self {
        Self {
            max_size: 500,
            default_ttl: Duration::from_millis(3_600_000), // 1 hour
        }
    }

    /// Search results go stale as the knowledge base changes
    pub fn query() -> Self {
        Self {
            max_size: 200,
            default_ttl: Duration::from_millis(300_000), // 5 minutes
        }
    }

    /// Full pipeline answers: expensive to regenerate, moderately volatile
    pub fn rag_answer() -> Self {
        Self {
            max_size: 100,
            default_ttl: Duration::from_millis(600_000), // 10 minutes
        }
    }

    /// Preset for a given tier
    pub fn for_tier(kind: TierKind) -> Self {
        match kind {
            TierKind::Embedding => Self::embedding(),
            TierKind::Query => Self::query(),
            TierKind::RagAnswer => Self::rag_answer(),
        }
    }
}

/// Settings for every tier, resolved once at process start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiersConfig {
    pub embedding: CacheConfig,
    pub query: CacheConfig,
    pub rag_answer: CacheConfig,
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            embedding: CacheConfig::embedding(),
            query: CacheConfig::query(),
            rag_answer: CacheConfig::rag_answer(),
        }
    }
}

impl TiersConfig {
    /// Defaults overridden by `RAG_CACHE_*` variables, after loading `.env`
    ///
    /// Recognised variables, per tier (`EMBEDDING`, `QUERY`, `RAG`):
    /// `RAG_CACHE_<TIER>_MAX_SIZE` and `RAG_CACHE_<TIER>_TTL_MS`.
    pub fn from_env() -> Result<Self> {
        load_optional_env_file(dotenv::dotenv())?;
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`TiersConfig::from_env`] but loading a specific env file
    ///
    /// Variables already set in the process environment take precedence
    /// over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        dotenv::from_path(path).map_err(|e| {
            CacheError::Config(format!("failed to load {}: {}", path.display(), e))
        })?;
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`TiersConfig::from_env`] but reading from an arbitrary source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        for kind in TierKind::ALL {
            let tier = config.tier_mut(kind);
            let env_name = kind.env_name();

            let size_var = format!("RAG_CACHE_{}_MAX_SIZE", env_name);
            if let Some(raw) = lookup(&size_var) {
                tier.max_size = parse_positive(&size_var, &raw)?;
            }

            let ttl_var = format!("RAG_CACHE_{}_TTL_MS", env_name);
            if let Some(raw) = lookup(&ttl_var) {
                tier.default_ttl = Duration::from_millis(parse_positive(&ttl_var, &raw)?);
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate every tier
    pub fn validate(&self) -> Result<()> {
        for kind in TierKind::ALL {
            self.tier(kind)
                .validate()
                .map_err(|e| CacheError::Config(format!("{} tier: {}", kind, e)))?;
        }
        Ok(())
    }

    /// Configuration of one tier
    pub fn tier(&self, kind: TierKind) -> &CacheConfig {
        match kind {
            TierKind::Embedding => &self.embedding,
            TierKind::Query => &self.query,
            TierKind::RagAnswer => &self.rag_answer,
        }
    }

    fn tier_mut(&mut self, kind: TierKind) -> &mut CacheConfig {
        match kind {
            TierKind::Embedding => &mut self.embedding,
            TierKind::Query => &mut self.query,
            TierKind::RagAnswer => &mut self.rag_answer,
        }
    }
}

/// Accept a missing `.env`; anything else it reports is a startup error
fn load_optional_env_file<T>(loaded: dotenv::Result<T>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::Config(format!("failed to load .env: {}", e))),
    }
}

fn parse_positive<T>(var: &str, raw: &str) -> Result<T>
where
    T: TryFrom<u64>,
    T::Error: fmt::Display,
{
    let invalid = |reason: String| CacheError::InvalidEnv {
        var: var.to_string(),
        value: raw.to_string(),
        reason,
    };

    let value: u64 = raw.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
    if value == 0 {
        return Err(invalid("must be greater than 0".to_string()));
    }
    T::try_from(value).map_err(|e| invalid(format!("{}", e)))
}

/// Durations serialize as whole milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
