//! Cache Facade Module
//!
//! Public `set`/`get` surface composing the entry store, the wait registry
//! and the background evictor.
//!
//! # Producer contract
//! A waiting `get` on a key that is absent and not in flight returns `None`
//! *and* marks the key as in flight. That caller is the producer: it must
//! compute the value and `set` it (or `release` the key if it gives up).
//! Every other waiting `get` on the key suspends until then.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::{CacheStats, EntryStore, Registration, WaitRegistry};
use crate::config::CacheOptions;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_evictor;

// == Wait ==
/// How a `get` behaves on a miss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Wait {
    /// Return `None` immediately
    #[default]
    No,
    /// Suspend until a producer stores the value
    Forever,
    /// Suspend until the value is stored or the duration elapses
    Timeout(Duration),
}

impl From<bool> for Wait {
    fn from(wait: bool) -> Self {
        if wait {
            Wait::Forever
        } else {
            Wait::No
        }
    }
}

impl From<Duration> for Wait {
    fn from(timeout: Duration) -> Self {
        Wait::Timeout(timeout)
    }
}

// == Shared State ==
/// Everything the facade and the evictor mutate, guarded by one lock.
#[derive(Debug)]
pub(crate) struct State<V> {
    store: EntryStore<V>,
    waiters: WaitRegistry<V>,
    stats: CacheStats,
}

impl<V: Clone> State<V> {
    fn lookup(&mut self, key: &str) -> Option<V> {
        match self.store.get_live(key, Instant::now()) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }
}

impl<V> State<V> {
    /// Removes expired entries whose key has no computation in flight.
    pub(crate) fn sweep(&mut self, now: Instant) -> usize {
        let Self {
            store,
            waiters,
            stats,
        } = self;
        let removed = store.remove_expired(now, |key| waiters.is_held(key));
        stats.record_swept(removed);
        removed
    }
}

// == Pending Waiter ==
/// A queued waiter's receiving side.
///
/// Dropping it before it settles withdraws the waiter from its key's queue,
/// so a cancelled `get` (outer timeout, `select!`, aborted task) leaves no
/// dead entry behind.
struct PendingWaiter<'a, V> {
    state: &'a Mutex<State<V>>,
    key: &'a str,
    id: u64,
    receiver: oneshot::Receiver<V>,
    /// Set once the waiter is no longer in the queue
    settled: bool,
}

impl<V> PendingWaiter<'_, V> {
    async fn wait(mut self, timeout: Option<Duration>) -> Option<V> {
        let received = match timeout {
            None => Some((&mut self.receiver).await),
            Some(timeout) => tokio::time::timeout(timeout, &mut self.receiver)
                .await
                .ok(),
        };

        if let Some(result) = received {
            // Delivered by `set`, or the registration was dropped
            self.settled = true;
            return result.ok();
        }

        let mut state = self.state.lock();
        state.waiters.withdraw(self.key, self.id);
        self.settled = true;
        // A set may have delivered between the deadline and taking the lock
        match self.receiver.try_recv() {
            Ok(value) => Some(value),
            Err(_) => {
                state.stats.record_timeout();
                debug!(key = self.key, waiter = self.id, "Waiter timed out");
                None
            }
        }
    }
}

impl<V> Drop for PendingWaiter<'_, V> {
    fn drop(&mut self) {
        if !self.settled {
            self.state.lock().waiters.withdraw(self.key, self.id);
            debug!(key = self.key, waiter = self.id, "Waiter cancelled");
        }
    }
}

// == Cache ==
/// In-process TTL cache with wait-for-in-flight-value coordination.
///
/// Share it between tasks behind an `Arc`. Dropping the cache stops its
/// eviction task.
#[derive(Debug)]
pub struct Cache<V> {
    state: Arc<Mutex<State<V>>>,
    options: CacheOptions,
    evictor: Option<JoinHandle<()>>,
}

impl<V> Cache<V>
where
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates a cache and starts its eviction sweep.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime, unless `options.disabled`
    /// is set (a disabled cache runs no background task).
    pub fn new(options: CacheOptions) -> Self {
        let state = Arc::new(Mutex::new(State {
            store: EntryStore::new(options.key_limit()),
            waiters: WaitRegistry::new(),
            stats: CacheStats::new(),
        }));

        let evictor = if options.disabled {
            None
        } else {
            Some(spawn_evictor(
                Arc::downgrade(&state),
                options.clean_interval(),
            ))
        };

        debug!(
            disabled = options.disabled,
            default_ttl_ms = options.default_ttl_ms,
            clean_interval_ms = options.clean_cache_interval_ms,
            max_keys = ?options.key_limit(),
            "Cache created"
        );

        Self {
            state,
            options,
            evictor,
        }
    }

    // == Set ==
    /// Stores `value` under `key`, then wakes every caller waiting on it.
    ///
    /// `ttl` overrides the default TTL for this write. Fails with
    /// [`CacheError::CapacityExceeded`] once the key cap is reached, even
    /// when `key` is already cached. A disabled cache discards the write.
    pub fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> Result<()> {
        if self.options.disabled {
            return Ok(());
        }

        let ttl = ttl.unwrap_or_else(|| self.options.default_ttl());
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let pending = state.waiters.is_held(key).then(|| value.clone());

        if let Err(err) = state.store.insert(key, value, ttl) {
            if matches!(err, CacheError::CapacityExceeded { .. }) {
                state.stats.record_rejected();
            }
            debug!(key, error = %err, "Rejected write");
            return Err(err);
        }
        debug!(key, ttl = ?ttl, "Stored value");

        let Some(value) = pending else {
            return Ok(());
        };
        let waiters = state.waiters.take(key).unwrap_or_default();
        let mut woken = 0;
        for waiter in waiters {
            let id = waiter.id;
            if waiter.wake(value.clone()) {
                woken += 1;
                debug!(key, waiter = id, "Woke waiter");
            } else {
                debug!(key, waiter = id, "Waiter left before value arrived");
            }
        }
        state.stats.record_woken(woken);

        Ok(())
    }

    // == Get ==
    /// Looks up `key`, optionally waiting for an in-flight value.
    ///
    /// - A live entry is returned without suspending.
    /// - On a miss with [`Wait::No`], returns `None`.
    /// - On a miss with waiting requested and nothing in flight, returns
    ///   `None` and makes the caller the producer for `key`.
    /// - Otherwise suspends until a `set` of `key` delivers the value, the
    ///   timeout elapses, or the key is released (the last two yield `None`).
    pub async fn get(&self, key: &str, wait: impl Into<Wait>) -> Option<V> {
        let wait = wait.into();
        if self.options.disabled {
            return None;
        }

        let (id, receiver) = {
            let mut state = self.state.lock();
            if let Some(value) = state.lookup(key) {
                debug!(key, "Cache hit");
                return Some(value);
            }
            if wait == Wait::No {
                return None;
            }
            let registration = state.waiters.register(key);
            match registration {
                Registration::Producer => {
                    state.stats.record_producer();
                    debug!(key, "Cache miss, caller designated producer");
                    return None;
                }
                Registration::Waiting { id, receiver } => (id, receiver),
            }
        };

        debug!(key, waiter = id, "Waiting for in-flight value");
        let pending = PendingWaiter {
            state: &self.state,
            key,
            id,
            receiver,
            settled: false,
        };
        match wait {
            Wait::Timeout(timeout) => pending.wait(Some(timeout)).await,
            _ => pending.wait(None).await,
        }
    }

    // == Peek ==
    /// Non-waiting lookup, usable from synchronous code.
    pub fn peek(&self, key: &str) -> Option<V> {
        if self.options.disabled {
            return None;
        }
        self.state.lock().lookup(key)
    }
}

impl<V> Cache<V> {
    // == Delete ==
    /// Removes the entry for `key`. In-flight registrations are untouched.
    pub fn delete(&self, key: &str) -> bool {
        self.state.lock().store.remove(key)
    }

    // == Release ==
    /// Abandons the in-flight computation for `key`.
    ///
    /// Drops the registration so every waiter resolves to `None` and the next
    /// waiting miss becomes the producer again. Returns the number of waiters
    /// released.
    pub fn release(&self, key: &str) -> usize {
        let released = self
            .state
            .lock()
            .waiters
            .take(key)
            .map_or(0, |waiters| waiters.len());
        debug!(key, released, "Released in-flight key");
        released
    }

    // == In Flight ==
    /// Returns true while a producer is computing `key`.
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.state.lock().waiters.is_held(key)
    }

    /// Number of callers currently suspended on `key`, the producer excluded.
    pub fn waiter_count(&self, key: &str) -> usize {
        self.state.lock().waiters.waiter_count(key)
    }

    // == Time To Live ==
    /// Remaining lifetime of the live entry for `key`, if any.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.state
            .lock()
            .store
            .get_live(key, Instant::now())
            .map(|entry| entry.ttl_remaining())
    }

    // == Sweep ==
    /// Runs one eviction sweep now, returning the number of entries removed.
    pub fn sweep(&self) -> usize {
        self.state.lock().sweep(Instant::now())
    }

    // == Stats ==
    /// Returns a snapshot of the counters plus current entry and in-flight
    /// key counts.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        let mut stats = state.stats.clone();
        stats.total_entries = state.store.len();
        stats.in_flight_keys = state.waiters.len();
        stats
    }

    // == Length ==
    /// Raw number of stored entries, expired-but-unswept ones included.
    pub fn len(&self) -> usize {
        self.state.lock().store.len()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.state.lock().store.is_empty()
    }

    // == Options ==
    /// Returns true if the cache was built as a no-op.
    pub fn is_disabled(&self) -> bool {
        self.options.disabled
    }

    /// The options this cache was built with.
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    // == Shutdown ==
    /// Stops the eviction sweep. Stored entries remain readable; expired
    /// ones are simply no longer removed.
    pub fn shutdown(&self) {
        if let Some(handle) = &self.evictor {
            handle.abort();
            debug!("Eviction sweep stopped");
        }
    }

    /// Returns true while the eviction task is alive.
    pub fn is_evictor_running(&self) -> bool {
        self.evictor
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<V> Drop for Cache<V> {
    fn drop(&mut self) {
        if let Some(handle) = self.evictor.take() {
            handle.abort();
        }
    }
}
