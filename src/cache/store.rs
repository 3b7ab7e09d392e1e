//! Cache Store Module
//!
//! Single-threaded cache engine: HashMap storage, TTL expiry and the
//! capacity bound. Locking and the background sweep live in [`super::Cache`].

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::cache::{CacheEntry, CacheStats, Clock, SystemClock};
use crate::config::CacheConfig;

// == Cache Store ==
/// Main cache storage with TTL expiry and soonest-expiry eviction.
#[derive(Debug)]
pub struct CacheStore<K, V, C = SystemClock> {
    /// Key-value storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Resolved configuration
    config: CacheConfig,
    /// Time source for expiry computations
    clock: C,
    /// Sequence number handed to the next inserted entry
    next_sequence: u64,
}

impl<K, V, C> CacheStore<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    // == Constructor ==
    /// Creates an empty store using `config` and reading time from `clock`.
    pub fn new(config: CacheConfig, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            config,
            clock,
            next_sequence: 0,
        }
    }

    // == Set ==
    /// Stores a key-value pair expiring one TTL from now.
    ///
    /// Overwriting an existing key replaces its value and expiry and never
    /// evicts. Inserting a new key into a store that already holds `max_size`
    /// entries first evicts the entry with the smallest expiry.
    pub fn set(&mut self, key: K, value: V) {
        let max_size = self.config.max_size;
        if max_size > 0 && self.entries.len() >= max_size && !self.entries.contains_key(&key) {
            self.evict_soonest_expiring();
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let entry = CacheEntry::new(value, self.clock.now_ms(), self.config.ttl_ms(), sequence);
        self.entries.insert(key, entry);
    }

    // == Get ==
    /// Retrieves a copy of the value stored under `key`.
    ///
    /// Returns `None` if the key is absent or its expiry has been reached,
    /// removing the expired entry on the way. With extend-on-access enabled a
    /// hit pushes the expiry to one TTL from now.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.entries.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            trace!("Dropped expired entry on read");
            return None;
        }

        let ttl_ms = self.config.ttl_ms();
        let extend = self.config.extend_on_access;
        let entry = self.entries.get_mut(key)?;
        if extend {
            entry.renew(now, ttl_ms);
        }
        self.stats.record_hit();
        Some(entry.value.clone())
    }

    // == Expire ==
    /// Removes `key` if present. Removing a missing key is a no-op.
    pub fn expire<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key);
    }

    // == Contains Key ==
    /// Returns true if `key` is present and not yet expired.
    ///
    /// Unlike [`get`](Self::get) this neither renews nor removes anything.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired_at(now))
    }

    // == Snapshot ==
    /// Returns an independent copy of every stored entry.
    ///
    /// Entries past their expiry that have not been swept yet are included.
    pub fn snapshot(&self) -> HashMap<K, CacheEntry<V>> {
        self.entries.clone()
    }

    // == Sweep Expired ==
    /// Removes all entries whose expiry has been reached.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = before - self.entries.len();
        self.stats.record_expirations(removed);
        removed
    }

    // == Clear ==
    /// Removes every entry. Statistics counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.entries.len();
        stats
    }

    /// Returns the resolved configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet
    /// swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Evict ==
    /// Removes the entry with the smallest expiry, the earliest inserted one
    /// on ties.
    fn evict_soonest_expiring(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.expires_at, entry.sequence))
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            self.entries.remove(&key);
            self.stats.record_eviction();
            debug!(
                max_size = self.config.max_size,
                "Capacity reached, evicted entry closest to expiry"
            );
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::config::CacheOptions;
    use std::time::Duration;

    fn store_with(options: CacheOptions) -> (CacheStore<String, String, ManualClock>, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        let store = CacheStore::new(options.resolve(), clock.clone());
        (store, clock)
    }

    fn default_store() -> (CacheStore<String, String, ManualClock>, ManualClock) {
        store_with(CacheOptions::default())
    }

    #[test]
    fn test_store_new() {
        let (store, _) = default_store();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_set_and_get() {
        let (mut store, _) = default_store();

        store.set("key1".to_string(), "value1".to_string());
        let value = store.get("key1");

        assert_eq!(value.as_deref(), Some("value1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_default_ttl_applied_on_set() {
        let (mut store, clock) = default_store();
        let now = clock.now_ms();

        store.set("a".to_string(), "v".to_string());

        let snapshot = store.snapshot();
        assert_eq!(snapshot["a"].expires_at, now + 300_000);
    }

    #[test]
    fn test_sub_millisecond_ttl_is_readable() {
        let (mut store, clock) = store_with(CacheOptions::default().with_ttl(0.0005));

        store.set("k".to_string(), "v".to_string());

        assert_eq!(store.get("k").as_deref(), Some("v"));
        assert!(store.snapshot()["k"].expires_at > clock.now_ms());
    }

    #[test]
    fn test_fractional_ttl_expiry_not_before_now_plus_ttl() {
        let (mut store, clock) = store_with(CacheOptions::default().with_ttl(1.0009));
        let now = clock.now_ms();

        store.set("k".to_string(), "v".to_string());

        // now + 1000.9 ms
        let expires_at = store.snapshot()["k"].expires_at;
        assert!(expires_at as f64 >= now as f64 + 1_000.9);
        assert_eq!(expires_at, now + 1_001);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let (mut store, _) = default_store();
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_expire() {
        let (mut store, _) = default_store();

        store.set("key1".to_string(), "value1".to_string());
        store.expire("key1");

        assert!(store.is_empty());
        assert!(store.get("key1").is_none());
        assert!(!store.snapshot().contains_key("key1"));
    }

    #[test]
    fn test_store_expire_nonexistent_is_noop() {
        let (mut store, _) = default_store();
        store.set("key1".to_string(), "value1".to_string());

        store.expire("nonexistent");
        store.expire("nonexistent");

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_overwrite() {
        let (mut store, clock) = default_store();

        store.set("key1".to_string(), "value1".to_string());
        clock.advance(Duration::from_secs(10));
        store.set("key1".to_string(), "value2".to_string());

        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot()["key1"].expires_at, clock.now_ms() + 300_000);
        assert_eq!(store.get("key1").as_deref(), Some("value2"));
    }

    #[test]
    fn test_expired_entry_hidden_before_sweep() {
        let (mut store, clock) = store_with(CacheOptions::default().with_ttl(1.0));

        store.set("key1".to_string(), "value1".to_string());
        clock.advance(Duration::from_millis(999));
        assert!(store.contains_key("key1"));

        clock.advance(Duration::from_millis(1));
        assert!(!store.contains_key("key1"));
        assert!(store.get("key1").is_none());
        assert!(store.is_empty(), "Expired entry should be dropped lazily on read");
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_extend_on_access_renews_expiry() {
        let (mut store, clock) = default_store();

        store.set("a".to_string(), "v".to_string());
        let before = store.snapshot()["a"].expires_at;

        clock.advance(Duration::from_millis(500));
        store.get("a");

        assert_eq!(store.snapshot()["a"].expires_at, before + 500);
    }

    #[test]
    fn test_no_extend_on_access_keeps_expiry() {
        let (mut store, clock) = store_with(CacheOptions::default().with_extend_on_access(false));

        store.set("a".to_string(), "v".to_string());
        let before = store.snapshot()["a"].expires_at;

        clock.advance(Duration::from_millis(500));
        assert!(store.get("a").is_some());

        assert_eq!(store.snapshot()["a"].expires_at, before);
    }

    #[test]
    fn test_contains_key_does_not_renew() {
        let (mut store, clock) = default_store();

        store.set("a".to_string(), "v".to_string());
        let before = store.snapshot()["a"].expires_at;
        clock.advance(Duration::from_secs(1));

        assert!(store.contains_key("a"));
        assert_eq!(store.snapshot()["a"].expires_at, before);
    }

    #[test]
    fn test_capacity_evicts_only_on_overflow() {
        let (mut store, clock) = store_with(CacheOptions::default().with_max_size(3));

        for key in ["key1", "key2", "key3"] {
            store.set(key.to_string(), "v".to_string());
            clock.advance(Duration::from_millis(10));
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.stats().evictions, 0);

        store.set("key4".to_string(), "v".to_string());

        assert_eq!(store.len(), 3);
        assert_eq!(store.stats().evictions, 1);
        assert!(store.get("key1").is_none());
        assert!(store.get("key2").is_some());
        assert!(store.get("key3").is_some());
        assert!(store.get("key4").is_some());
    }

    #[test]
    fn test_capacity_evicts_smallest_expiry() {
        let (mut store, clock) = store_with(CacheOptions::default().with_max_size(2));

        store.set("a".to_string(), "v".to_string());
        clock.advance(Duration::from_millis(10));
        store.set("b".to_string(), "v".to_string());
        clock.advance(Duration::from_millis(10));

        // Reading "a" renews it past "b"
        store.get("a");
        store.set("c".to_string(), "v".to_string());

        let snapshot = store.snapshot();
        assert!(snapshot.contains_key("a"));
        assert!(!snapshot.contains_key("b"));
        assert!(snapshot.contains_key("c"));
    }

    #[test]
    fn test_capacity_tie_breaks_on_insertion_order() {
        let (mut store, _) = store_with(CacheOptions::default().with_max_size(3));

        for key in ["x", "y", "z", "w"] {
            store.set(key.to_string(), "v".to_string());
        }

        let snapshot = store.snapshot();
        assert!(!snapshot.contains_key("x"));
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let (mut store, clock) = store_with(CacheOptions::default().with_max_size(2));

        store.set("a".to_string(), "v".to_string());
        clock.advance(Duration::from_millis(10));
        store.set("b".to_string(), "v".to_string());
        store.set("a".to_string(), "v2".to_string());

        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().evictions, 0);
        assert_eq!(store.get("b").as_deref(), Some("v"));
    }

    #[test]
    fn test_unbounded_store_never_evicts() {
        let (mut store, _) = default_store();

        for i in 0..1_000 {
            store.set(format!("key{}", i), "v".to_string());
        }

        assert_eq!(store.len(), 1_000);
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_store_sweep_expired() {
        let (mut store, clock) = store_with(CacheOptions::default().with_ttl(1.0));

        store.set("key1".to_string(), "value1".to_string());
        clock.advance(Duration::from_millis(600));
        store.set("key2".to_string(), "value2".to_string());
        clock.advance(Duration::from_millis(400));

        let removed = store.sweep_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("key2").is_some());
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let (mut store, _) = default_store();
        store.set("a".to_string(), "v".to_string());

        let mut snapshot = store.snapshot();
        snapshot.remove("a");
        snapshot.insert("b".to_string(), store.snapshot()["a"].clone());
        if let Some(entry) = snapshot.get_mut("b") {
            entry.value = "changed".to_string();
        }

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").as_deref(), Some("v"));
        assert!(store.get("b").is_none());
    }

    #[test]
    fn test_store_stats() {
        let (mut store, _) = default_store();

        store.set("key1".to_string(), "value1".to_string());
        store.get("key1"); // hit
        store.get("nonexistent"); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_clear_keeps_counters() {
        let (mut store, _) = default_store();

        store.set("key1".to_string(), "value1".to_string());
        store.get("key1");
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.stats().hits, 1);
    }
}
