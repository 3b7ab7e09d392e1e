//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired cache entries.

use std::hash::Hash;
use std::sync::Weak;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStore, Clock};

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task sleeps for `interval` between sweeps and holds the store lock
/// only for the duration of a single sweep. It keeps a weak reference, so
/// once the store has been dropped the task ends on its next tick.
///
/// # Arguments
/// * `runtime` - Tokio runtime the task is spawned on
/// * `store` - Weak reference to the shared cache store
/// * `interval` - Time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which the owning cache aborts when it
/// is stopped or dropped.
pub fn spawn_sweeper<K, V, C>(
    runtime: &Handle,
    store: Weak<Mutex<CacheStore<K, V, C>>>,
    interval: Duration,
) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
    C: Clock,
{
    runtime.spawn(async move {
        info!(?interval, "Starting expiry sweeper");

        loop {
            tokio::time::sleep(interval).await;

            let Some(shared) = store.upgrade() else {
                debug!("Cache dropped, stopping expiry sweeper");
                break;
            };

            let (removed, remaining) = {
                let mut guard = shared.lock();
                let removed = guard.sweep_expired();
                (removed, guard.len())
            };

            if removed > 0 {
                debug!(removed, remaining, "Sweep removed expired entries");
            } else {
                debug!("Sweep found no expired entries");
            }
        }
    })
}
