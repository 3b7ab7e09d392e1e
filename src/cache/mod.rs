//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and a size bound.

mod clock;
mod entry;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use shared::Cache;
pub use stats::CacheStats;
pub use store::CacheStore;
