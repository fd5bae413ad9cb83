//! Eviction Sweep Task
//!
//! Background task that periodically removes expired cache entries, leaving
//! alone every key that has a computation in flight.

use std::sync::Weak;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::State;
use crate::config::millis;

/// Spawns the eviction sweep for one cache instance.
///
/// The task sleeps for `interval` between sweeps and takes the cache lock
/// only for the duration of a sweep. It holds a weak reference, so it ends
/// on its own once the cache is dropped; the returned handle lets the owner
/// abort it earlier.
pub(crate) fn spawn_evictor<V>(state: Weak<Mutex<State<V>>>, interval: Duration) -> JoinHandle<()>
where
    V: Send + 'static,
{
    tokio::spawn(async move {
        info!(
            interval_ms = millis(interval),
            "Starting eviction sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let Some(shared) = state.upgrade() else {
                info!("Cache dropped, stopping eviction sweep task");
                break;
            };

            let removed = shared.lock().sweep(Instant::now());

            if removed > 0 {
                debug!(removed, "Eviction sweep removed expired entries");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::cache::{Cache, Wait};
    use crate::config::CacheOptions;

    fn sweeping_cache(interval_ms: u64) -> Cache<String> {
        Cache::new(
            CacheOptions::default().with_clean_interval(Duration::from_millis(interval_ms)),
        )
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_entries() {
        let cache = sweeping_cache(20);

        cache
            .set("expire_soon", "value".to_string(), Some(Duration::from_millis(10)))
            .unwrap();
        assert_eq!(cache.len(), 1);

        // Wait for entry to expire and a sweep to run
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.len(), 0, "Expired entry should have been swept");
        assert!(cache.stats().swept >= 1);
    }

    #[tokio::test]
    async fn test_sweep_preserves_valid_entries() {
        let cache = sweeping_cache(20);

        cache
            .set("long_lived", "value".to_string(), Some(Duration::from_secs(3600)))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.peek("long_lived"), Some("value".to_string()));
    }

    #[tokio::test]
    async fn test_sweep_skips_keys_with_waiters() {
        let cache = Arc::new(sweeping_cache(20));

        cache
            .set("k", "stale".to_string(), Some(Duration::from_millis(5)))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Expired entry, computation reopened by a producer
        assert_eq!(cache.get("k", Wait::Forever).await, None);

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.len(), 1, "Held key must survive sweeps");
        assert!(cache.is_in_flight("k"));
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_stopped() {
        let cache = sweeping_cache(10);

        cache.shutdown();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!cache.is_evictor_running(), "Task should be finished after shutdown");
    }
}
