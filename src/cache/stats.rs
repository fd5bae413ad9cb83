//! Cache Statistics Module
//!
//! Tracks hits, misses, in-flight coordination and sweep activity.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads served from a live entry
    pub hits: u64,
    /// Reads that found no live entry
    pub misses: u64,
    /// Waiting misses told to compute the value themselves
    pub producers: u64,
    /// Waiters resolved with a stored value
    pub waiters_woken: u64,
    /// Waiters whose deadline elapsed before a value arrived
    pub waiters_timed_out: u64,
    /// Entries removed by eviction sweeps
    pub swept: u64,
    /// Writes refused by the admission check
    pub rejected_writes: u64,
    /// Current number of entries, expired-but-unswept ones included
    pub total_entries: usize,
    /// Keys with a computation in flight
    pub in_flight_keys: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Recorders ==
    /// Counts a read served from a live entry.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Counts a read that found no live entry.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Counts a caller designated as producer.
    pub fn record_producer(&mut self) {
        self.producers += 1;
    }

    /// Adds `count` waiters resolved by a write.
    pub fn record_woken(&mut self, count: u64) {
        self.waiters_woken += count;
    }

    /// Counts a waiter whose deadline elapsed.
    pub fn record_timeout(&mut self) {
        self.waiters_timed_out += 1;
    }

    /// Adds `count` entries removed by a sweep.
    pub fn record_swept(&mut self, count: usize) {
        self.swept += count as u64;
    }

    /// Counts a write refused by the admission check.
    pub fn record_rejected(&mut self) {
        self.rejected_writes += 1;
    }
}
