//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with an absolute expiry.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Entry ==
/// A stored value together with the instant it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Insertion order, breaks ties between equal expiries
    #[serde(skip)]
    pub(crate) sequence: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry expiring `ttl_ms` after `now_ms`.
    pub(crate) fn new(value: V, now_ms: u64, ttl_ms: u64, sequence: u64) -> Self {
        Self {
            value,
            expires_at: now_ms.saturating_add(ttl_ms),
            sequence,
        }
    }

    // == Renew ==
    pub(crate) fn renew(&mut self, now_ms: u64, ttl_ms: u64) {
        self.expires_at = now_ms.saturating_add(ttl_ms);
    }

    // == Is Expired ==
    /// Checks whether the entry is expired at `now_ms`.
    ///
    /// An entry is expired once the current time reaches its expiry, so an
    /// entry whose expiry equals `now_ms` is already gone.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        self.expires_at <= now_ms
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at.saturating_sub(now_ms)
    }

    /// Expiry as a UTC timestamp, `None` if it is out of chrono's range.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.expires_at)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }
}
