//! Cache entry with TTL support

use chrono::{DateTime, Utc};
use std::time::Duration;

/// A stored value together with the bookkeeping needed to expire it
///
/// Entries are replaced wholesale on re-set; they are never patched.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,

    /// When the value was written
    pub stored_at: DateTime<Utc>,

    /// How long the value stays fresh
    pub ttl: Duration,

    /// Insertion-order slot, used for FIFO eviction
    pub(crate) slot: u64,
}

impl<V> CacheEntry<V> {
    /// Create a new entry stored at `now`
    pub fn new(value: V, stored_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            stored_at,
            ttl,
            slot: 0,
        }
    }

    /// Age of the entry relative to `now` (zero if `now` is in the past)
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// An entry is expired once its age strictly exceeds its TTL
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.age(now) > self.ttl
    }

    /// Time left before expiry, `None` once expired
    pub fn time_until_expiration(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.is_expired(now) {
            None
        } else {
            Some(self.ttl - self.age(now))
        }
    }
}
