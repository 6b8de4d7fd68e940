//! Bounded TTL cache with FIFO eviction
//!
//! Eviction policy: when the cache is full and a *new* key arrives, the entry
//! occupying the oldest insertion slot is dropped. Reads never move an entry
//! and remaining TTL plays no part. This is FIFO, not LRU.
//!
//! Expiry is lazy. An expired entry stays in storage (and counts towards
//! [`TtlCache::len`]) until a `get` reaps it, the eviction path displaces it,
//! or [`TtlCache::purge_expired`] is called explicitly.

use crate::cache::{
    clock::{Clock, SystemClock},
    config::CacheConfig,
    entry::CacheEntry,
    types::{CacheKey, CacheStats},
};
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Thread-safe bounded cache keyed by string, one TTL per entry
///
/// Every operation takes a single lock, runs to completion and releases it,
/// so capacity check, eviction and insert in [`TtlCache::set`] are atomic.
/// Nothing here blocks on I/O or awaits.
pub struct TtlCache<V> {
    /// Label used in log lines
    name: String,

    /// Validated configuration
    config: CacheConfig,

    /// Time source for `stored_at` and ageing
    clock: Arc<dyn Clock>,

    /// Internal storage
    store: Mutex<CacheStore<V>>,
}

/// Internal cache storage
struct CacheStore<V> {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry<V>>,

    /// Insertion order as (slot, key). Records whose slot no longer matches
    /// the live entry are stale and skipped on eviction.
    order: VecDeque<(u64, CacheKey)>,

    /// Next insertion slot to hand out
    next_slot: u64,

    /// Running statistics
    stats: CacheStats,
}

impl<V> CacheStore<V> {
    fn is_live(&self, slot: u64, key: &str) -> bool {
        self.entries.get(key).is_some_and(|e| e.slot == slot)
    }

    /// Drop the entry in the oldest live insertion slot
    fn evict_oldest(&mut self) -> Option<CacheKey> {
        while let Some((slot, key)) = self.order.pop_front() {
            if self.is_live(slot, &key) {
                self.entries.remove(&key);
                return Some(key);
            }
        }
        None
    }

    /// Discard stale order records once they outnumber live ones
    fn compact_order(&mut self, max_size: usize) {
        if self.order.len() > max_size.saturating_mul(2) {
            let entries = &self.entries;
            self.order
                .retain(|(slot, key)| entries.get(key).is_some_and(|e| e.slot == *slot));
        }
    }
}

impl<V> TtlCache<V> {
    /// Create a new cache using the wall clock
    ///
    /// Fails if the configuration is invalid (zero capacity or zero TTL).
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache with a custom time source
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        info!(
            "Initializing cache (max_size: {}, default_ttl: {:?})",
            config.max_size, config.default_ttl
        );

        let store = CacheStore {
            entries: HashMap::with_capacity(config.max_size),
            order: VecDeque::with_capacity(config.max_size),
            next_slot: 0,
            stats: CacheStats::default(),
        };

        Ok(Self {
            name: "cache".to_string(),
            config,
            clock,
            store: Mutex::new(store),
        })
    }

    /// Give the cache a name for log output
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Cache name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Insert a value using the configured default TTL
    pub fn set(&self, key: impl Into<CacheKey>, value: V) {
        self.set_with_ttl(key, value, self.config.default_ttl);
    }

    /// Insert a value with an explicit TTL
    ///
    /// Overwriting a present key replaces its value, timestamp and TTL but
    /// keeps its insertion slot, so it never evicts anything.
    pub fn set_with_ttl(&self, key: impl Into<CacheKey>, value: V, ttl: Duration) {
        let key = key.into();
        let now = self.clock.now();
        let mut guard = self.store.lock();
        let store = &mut *guard;

        if let Some(existing) = store.entries.get_mut(&key) {
            debug!("[{}] Updating existing cache entry: {}", self.name, key);
            let slot = existing.slot;
            *existing = CacheEntry {
                slot,
                ..CacheEntry::new(value, now, ttl)
            };
            return;
        }

        if store.entries.len() >= self.config.max_size {
            match store.evict_oldest() {
                Some(evicted) => {
                    debug!("[{}] Evicting oldest entry: {}", self.name, evicted);
                    store.stats.evictions_capacity += 1;
                }
                None => debug!("[{}] At capacity with nothing to evict", self.name),
            }
        }

        debug!("[{}] Inserting new cache entry: {}", self.name, key);
        let slot = store.next_slot;
        store.next_slot += 1;
        store.order.push_back((slot, key.clone()));
        store.entries.insert(
            key,
            CacheEntry {
                slot,
                ..CacheEntry::new(value, now, ttl)
            },
        );
        store.compact_order(self.config.max_size);
    }

    /// Insert a value with an optional TTL override (`None` means the default)
    pub fn put(&self, key: impl Into<CacheKey>, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.config.default_ttl);
        self.set_with_ttl(key, value, ttl);
    }

    /// Remove an entry. Returns whether anything was removed.
    pub fn remove(&self, key: &str) -> bool {
        let mut store = self.store.lock();

        if store.entries.remove(key).is_some() {
            store.stats.invalidations += 1;
            debug!("[{}] Removed cache entry: {}", self.name, key);
            true
        } else {
            false
        }
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        let mut store = self.store.lock();

        let count = store.entries.len();
        store.entries.clear();
        store.order.clear();
        store.stats.invalidations += count as u64;

        info!("[{}] Cleared {} entries from cache", self.name, count);
    }

    /// Check if a key is stored, without reaping or counting a hit/miss
    pub fn contains_key(&self, key: &str) -> bool {
        self.store.lock().entries.contains_key(key)
    }

    /// Number of stored entries, including expired ones not yet reaped
    pub fn len(&self) -> usize {
        self.store.lock().entries.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.store.lock().entries.is_empty()
    }

    /// Remove every expired entry now. Returns how many were removed.
    ///
    /// Never called automatically; expiry is otherwise lazy.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut store = self.store.lock();

        let before = store.entries.len();
        store.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - store.entries.len();
        store.stats.evictions_ttl += removed as u64;

        if removed > 0 {
            debug!("[{}] Purged {} expired entries", self.name, removed);
        }
        removed
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let store = self.store.lock();
        CacheStats {
            entries: store.entries.len(),
            ..store.stats
        }
    }
}

impl<V: Clone> TtlCache<V> {
    /// Get a value from the cache
    ///
    /// An expired entry is deleted on the spot and reported as a miss.
    /// A hit does not change the entry's eviction position.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut guard = self.store.lock();
        let store = &mut *guard;

        let expired = match store.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                debug!("[{}] Cache miss: {}", self.name, key);
                store.stats.misses += 1;
                return None;
            }
        };

        if expired {
            debug!("[{}] Cache entry expired: {}", self.name, key);
            store.entries.remove(key);
            store.stats.misses += 1;
            store.stats.evictions_ttl += 1;
            return None;
        }

        debug!("[{}] Cache hit: {}", self.name, key);
        store.stats.hits += 1;
        store.entries.get(key).map(|entry| entry.value.clone())
    }
}
