//! Error types for the cache
//!
//! Cache operations themselves are total; errors only arise around the
//! lifecycle of the background sweeper.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache was constructed outside of a Tokio runtime, so the sweeper
    /// could not be spawned
    #[error("No Tokio runtime available to run the sweeper: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// The sweeper task panicked before it was stopped
    #[error("Sweeper task panicked: {0}")]
    SweeperPanicked(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
