//! Configuration Module
//!
//! Resolves user supplied cache options into normalized internal values.

use std::time::Duration;

use serde::Deserialize;

/// Default time-to-live in seconds.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Smallest sweep interval the cache will schedule.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Construction options for a cache.
///
/// Every field is optional so that an omitted option can be told apart from
/// one explicitly set to `false` or `0`. Durations are given in seconds and
/// may be fractional. Options deserialize from camelCase keys:
///
/// ```
/// use ttl_cache::CacheOptions;
///
/// let options = CacheOptions::default().with_ttl(10.0).with_max_size(2);
/// assert_eq!(options.resolve().max_size, 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheOptions {
    /// Default TTL in seconds for every entry
    pub ttl: Option<f64>,
    /// Sweeper cadence in seconds
    pub expire_poll_time: Option<f64>,
    /// Renew an entry's expiry on every successful read
    pub extend_on_access: Option<bool>,
    /// Maximum number of entries, 0 means unbounded
    pub max_size: Option<usize>,
}

impl CacheOptions {
    /// Sets the default TTL in seconds.
    pub fn with_ttl(mut self, secs: f64) -> Self {
        self.ttl = Some(secs);
        self
    }

    /// Sets the sweeper cadence in seconds.
    pub fn with_expire_poll_time(mut self, secs: f64) -> Self {
        self.expire_poll_time = Some(secs);
        self
    }

    /// Enables or disables expiry renewal on read.
    pub fn with_extend_on_access(mut self, extend: bool) -> Self {
        self.extend_on_access = Some(extend);
        self
    }

    /// Sets the capacity bound.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    // == Resolve ==
    /// Normalizes the options into a [`CacheConfig`].
    ///
    /// Never fails: missing, non-finite, negative or zero durations fall back
    /// to their defaults. The poll interval defaults to half the TTL and is
    /// never shorter than [`MIN_POLL_INTERVAL`].
    pub fn resolve(&self) -> CacheConfig {
        let ttl = self
            .ttl
            .and_then(positive_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TTL_SECS));

        let poll_interval = self
            .expire_poll_time
            .and_then(positive_secs)
            .unwrap_or(ttl / 2)
            .max(MIN_POLL_INTERVAL);

        CacheConfig {
            ttl,
            poll_interval,
            extend_on_access: self.extend_on_access.unwrap_or(true),
            max_size: self.max_size.unwrap_or(0),
        }
    }
}

fn positive_secs(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|duration| !duration.is_zero())
}

/// Resolved cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time-to-live applied on creation and on access renewal
    pub ttl: Duration,
    /// Sweeper cadence
    pub poll_interval: Duration,
    /// Whether a successful read resets the entry's expiry
    pub extend_on_access: bool,
    /// Capacity bound, 0 means unbounded
    pub max_size: usize,
}

impl CacheConfig {
    /// TTL in milliseconds, as added to clock readings.
    ///
    /// Rounded up so a positive TTL never yields an entry that is already
    /// expired, and expiry never lands before `now + ttl`.
    pub fn ttl_ms(&self) -> u64 {
        u64::try_from(self.ttl.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheOptions::default().resolve()
    }
}
