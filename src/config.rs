//! Configuration Module
//!
//! Cache options, loadable from environment variables or built in code.

use std::env;
use std::time::Duration;

use serde::Deserialize;

/// Default TTL applied to writes that don't specify their own.
pub const DEFAULT_TTL_MS: u64 = 5_000;

/// Default period of the eviction sweep.
pub const DEFAULT_CLEAN_INTERVAL_MS: u64 = 30_000;

/// Cache configuration parameters.
///
/// Every field is optional when deserializing; missing ones take the
/// values from [`CacheOptions::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    /// Turns the cache into a no-op: writes are dropped, reads miss
    pub disabled: bool,
    /// TTL in milliseconds for writes without an explicit TTL
    pub default_ttl_ms: u64,
    /// Eviction sweep interval in milliseconds
    pub clean_cache_interval_ms: u64,
    /// Admission cap on the number of entries, `None` or `Some(0)` = unbounded
    pub max_number_of_cached_keys: Option<usize>,
}

impl CacheOptions {
    // == From Env ==
    /// Creates options by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DISABLED` - `true`/`false` (default: false)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 5000)
    /// - `CACHE_CLEAN_INTERVAL_MS` - Sweep frequency in milliseconds (default: 30000)
    /// - `CACHE_MAX_KEYS` - Maximum cached keys, 0 = unbounded (default: unbounded)
    pub fn from_env() -> Self {
        Self {
            disabled: env::var("CACHE_DISABLED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            default_ttl_ms: env::var("CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TTL_MS),
            clean_cache_interval_ms: env::var("CACHE_CLEAN_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CLEAN_INTERVAL_MS),
            max_number_of_cached_keys: env::var("CACHE_MAX_KEYS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    // == Builders ==
    /// Turns the cache into a no-op.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Sets the TTL for writes without their own, saturating at `u64::MAX` ms.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl_ms = millis(ttl);
        self
    }

    /// Sets the sweep period, saturating at `u64::MAX` ms.
    pub fn with_clean_interval(mut self, interval: Duration) -> Self {
        self.clean_cache_interval_ms = millis(interval);
        self
    }

    /// Caps the number of cached keys; zero means unbounded.
    pub fn with_max_keys(mut self, max: usize) -> Self {
        self.max_number_of_cached_keys = Some(max);
        self
    }

    // == Accessors ==
    /// Default TTL as a `Duration`.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Sweep period, never shorter than one millisecond.
    pub fn clean_interval(&self) -> Duration {
        Duration::from_millis(self.clean_cache_interval_ms.max(1))
    }

    /// Effective admission cap; zero is treated as "no cap".
    pub fn key_limit(&self) -> Option<usize> {
        self.max_number_of_cached_keys.filter(|&max| max > 0)
    }
}

/// Whole milliseconds in `duration`, saturating instead of truncating.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            disabled: false,
            default_ttl_ms: DEFAULT_TTL_MS,
            clean_cache_interval_ms: DEFAULT_CLEAN_INTERVAL_MS,
            max_number_of_cached_keys: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let options = CacheOptions::default();
        assert!(!options.disabled);
        assert_eq!(options.default_ttl_ms, 5_000);
        assert_eq!(options.clean_cache_interval_ms, 30_000);
        assert_eq!(options.max_number_of_cached_keys, None);
        assert_eq!(options.key_limit(), None);
    }

    #[test]
    fn test_options_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_DISABLED");
        env::remove_var("CACHE_DEFAULT_TTL_MS");
        env::remove_var("CACHE_CLEAN_INTERVAL_MS");
        env::remove_var("CACHE_MAX_KEYS");

        let options = CacheOptions::from_env();
        assert_eq!(options, CacheOptions::default());
    }

    #[test]
    fn test_zero_key_cap_is_unbounded() {
        let options = CacheOptions::default().with_max_keys(0);
        assert_eq!(options.key_limit(), None);

        let options = CacheOptions::default().with_max_keys(5);
        assert_eq!(options.key_limit(), Some(5));
    }

    #[test]
    fn test_clean_interval_is_clamped() {
        let options = CacheOptions::default().with_clean_interval(Duration::ZERO);
        assert_eq!(options.clean_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_builders() {
        let options = CacheOptions::default()
            .with_disabled(true)
            .with_default_ttl(Duration::from_millis(250))
            .with_clean_interval(Duration::from_secs(2));

        assert!(options.disabled);
        assert_eq!(options.default_ttl(), Duration::from_millis(250));
        assert_eq!(options.clean_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_huge_durations_saturate() {
        let options = CacheOptions::default()
            .with_default_ttl(Duration::MAX)
            .with_clean_interval(Duration::MAX);

        assert_eq!(options.default_ttl_ms, u64::MAX);
        assert_eq!(options.clean_cache_interval_ms, u64::MAX);
    }

    #[test]
    fn test_deserialize_partial() {
        let options: CacheOptions =
            serde_json::from_str(r#"{"default_ttl_ms": 100, "max_number_of_cached_keys": 3}"#)
                .unwrap();

        assert_eq!(options.default_ttl_ms, 100);
        assert_eq!(options.clean_cache_interval_ms, DEFAULT_CLEAN_INTERVAL_MS);
        assert_eq!(options.key_limit(), Some(3));
        assert!(!options.disabled);
    }
}
