//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

/// Lifetime used when `now + ttl` is not representable.
pub const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 86_400);

// == Cache Entry ==
/// A stored value together with its absolute expiry deadline.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value, never inspected by the cache
    pub value: V,
    /// When the entry was written
    pub created_at: Instant,
    /// When the entry stops being served
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry that expires `ttl` from now.
    ///
    /// A TTL too large to add to the clock (e.g. `Duration::MAX`) is capped
    /// at [`FAR_FUTURE`], which in practice means "never expires".
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);

        Self {
            value,
            created_at: now,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry whose deadline equals `now` is already
    /// expired, so a zero TTL is never served.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at <= now
    }

    // == Is Expired (now) ==
    /// Checks if the entry has expired as of the current time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
