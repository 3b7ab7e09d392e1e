//! TTL Cache - An embeddable in-memory key-value cache
//!
//! Entries expire after a configurable time-to-live. Expired entries are
//! hidden from reads immediately and physically removed by a background
//! sweeper task. An optional size bound evicts the entry closest to expiry.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheEntry, CacheStats, CacheStore, Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheOptions};
pub use error::{CacheError, Result};
pub use tasks::spawn_sweeper;
