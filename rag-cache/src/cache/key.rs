//! Deterministic cache key derivation
//!
//! A key is `prefix:name1:value1|name2:value2|...` with parameter names in
//! ascending code-point order. The same logical parameter set always maps
//! to the same key, whatever order it was supplied in. The prefix
//! namespaces keys so different consumers cannot collide.

use crate::cache::types::CacheKey;
use crate::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Separator between the prefix and the parameter segment
pub const PREFIX_SEPARATOR: char = ':';

/// Separator between a parameter name and its value
pub const PAIR_SEPARATOR: char = ':';

/// Separator between parameter pairs
pub const PARAM_SEPARATOR: char = '|';

/// Derive a canonical key from a prefix and a set of named parameters
///
/// If a name appears more than once, the last value wins.
///
/// ```
/// use rag_cache::cache::cache_key;
///
/// let a = cache_key("q", [("b", 2), ("a", 1)]);
/// let b = cache_key("q", [("a", 1), ("b", 2)]);
/// assert_eq!(a, b);
/// assert_eq!(a, "q:a:1|b:2");
/// ```
pub fn cache_key<I, K, V>(prefix: &str, params: I) -> CacheKey
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Display,
{
    let sorted: BTreeMap<String, String> = params
        .into_iter()
        .map(|(name, value)| (name.into(), value.to_string()))
        .collect();

    render(prefix, &sorted)
}

fn render(prefix: &str, params: &BTreeMap<String, String>) -> CacheKey {
    let pairs: Vec<String> = params
        .iter()
        .map(|(name, value)| format!("{}{}{}", name, PAIR_SEPARATOR, value))
        .collect();

    format!(
        "{}{}{}",
        prefix,
        PREFIX_SEPARATOR,
        pairs.join(&PARAM_SEPARATOR.to_string())
    )
}

/// Builder form of [`cache_key`] for mixed parameter types
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    prefix: String,
    params: BTreeMap<String, String>,
}

impl CacheKeyBuilder {
    /// Create a new cache key builder
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            params: BTreeMap::new(),
        }
    }

    /// Add a parameter rendered through `Display`
    pub fn param(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Add a parameter only when it is present
    pub fn param_opt<T: Display>(self, name: impl Into<String>, value: Option<T>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }

    /// Add a structured parameter as compact JSON with sorted object keys
    pub fn json_param<T: Serialize + ?Sized>(
        mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<Self> {
        // Going through Value sorts object keys (BTreeMap-backed map)
        let canonical = serde_json::to_value(value)?;
        self.params
            .insert(name.into(), serde_json::to_string(&canonical)?);
        Ok(self)
    }

    /// Build the cache key
    pub fn build(&self) -> CacheKey {
        render(&self.prefix, &self.params)
    }
}
