//! Shared Cache Module
//!
//! Thread-safe cache handle that owns the store and its expiry sweeper.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheEntry, CacheStats, CacheStore, Clock, SystemClock};
use crate::config::{CacheConfig, CacheOptions};
use crate::error::{CacheError, Result};
use crate::tasks::spawn_sweeper;

/// In-memory cache with TTL expiration and a background sweeper.
///
/// All operations take a single lock for their duration and never block on
/// I/O. The sweeper runs on the Tokio runtime the cache was created in and is
/// stopped when the cache is dropped.
///
/// ```
/// use ttl_cache::{Cache, CacheOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cache: Cache<String, u32> = Cache::new(CacheOptions::default().with_ttl(60.0));
/// cache.set("answer".to_string(), 42);
/// assert_eq!(cache.get("answer"), Some(42));
///
/// cache.expire("answer");
/// assert_eq!(cache.get("answer"), None);
/// # }
/// ```
#[derive(Debug)]
pub struct Cache<K, V, C = SystemClock> {
    /// Store shared with the sweeper
    store: Arc<Mutex<CacheStore<K, V, C>>>,
    /// Resolved configuration
    config: CacheConfig,
    /// Sweeper task, `None` once stopped
    sweeper: Option<JoinHandle<()>>,
}

impl<K, V> Cache<K, V, SystemClock>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    // == Constructors ==
    /// Creates a cache driven by the system clock.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime; see [`Cache::try_new`].
    pub fn new(options: CacheOptions) -> Self {
        Self::with_clock(options, SystemClock)
    }

    /// Creates a cache driven by the system clock, failing if no Tokio
    /// runtime is available to run the sweeper.
    pub fn try_new(options: CacheOptions) -> Result<Self> {
        Self::try_with_clock(options, SystemClock)
    }
}

impl<K, V, C> Cache<K, V, C>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
    C: Clock,
{
    /// Creates a cache reading time from `clock`.
    ///
    /// # Panics
    /// Panics if called outside of a Tokio runtime; see
    /// [`Cache::try_with_clock`].
    pub fn with_clock(options: CacheOptions, clock: C) -> Self {
        Self::start(options.resolve(), clock, &Handle::current())
    }

    /// Creates a cache reading time from `clock`, failing if no Tokio runtime
    /// is available to run the sweeper.
    pub fn try_with_clock(options: CacheOptions, clock: C) -> Result<Self> {
        let runtime = Handle::try_current()?;
        Ok(Self::start(options.resolve(), clock, &runtime))
    }

    fn start(config: CacheConfig, clock: C, runtime: &Handle) -> Self {
        let store = Arc::new(Mutex::new(CacheStore::new(config, clock)));
        let sweeper = spawn_sweeper(runtime, Arc::downgrade(&store), config.poll_interval);

        info!(
            ttl = ?config.ttl,
            poll_interval = ?config.poll_interval,
            extend_on_access = config.extend_on_access,
            max_size = config.max_size,
            "Cache initialized"
        );

        Self {
            store,
            config,
            sweeper: Some(sweeper),
        }
    }

    // == Operations ==
    /// Stores `value` under `key`, expiring one TTL from now.
    pub fn set(&self, key: K, value: V) {
        self.store.lock().set(key, value);
    }

    /// Returns a copy of the value under `key`, or `None` if it is absent or
    /// expired.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().get(key)
    }

    /// Removes `key`. Missing keys are ignored.
    pub fn expire<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().expire(key);
    }

    /// Returns true if `key` is present and not expired, without renewing it.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.store.lock().contains_key(key)
    }

    /// Returns an independent copy of all stored entries.
    pub fn snapshot(&self) -> HashMap<K, CacheEntry<V>> {
        self.store.lock().snapshot()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.store.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl<K, V, C> Cache<K, V, C> {
    // == Lifecycle ==
    /// Returns true while the sweeper task is alive.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the sweeper. Entries stay readable and still expire lazily.
    ///
    /// Calling this more than once is a no-op.
    pub fn stop(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
            debug!("Expiry sweeper aborted");
        }
    }

    /// Stops the sweeper and waits for it to finish.
    ///
    /// Fails only if the sweeper panicked.
    pub async fn shutdown(mut self) -> Result<()> {
        let Some(handle) = self.sweeper.take() else {
            return Ok(());
        };

        handle.abort();
        match handle.await {
            Ok(()) => Ok(()),
            Err(err) if err.is_cancelled() => Ok(()),
            Err(err) => Err(CacheError::SweeperPanicked(err.to_string())),
        }
    }
}

impl<K, V, C> Drop for Cache<K, V, C> {
    fn drop(&mut self) {
        self.stop();
    }
}
