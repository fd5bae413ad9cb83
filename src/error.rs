//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Cache misses are never
//! errors: they surface as `None` from the read paths.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache writes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The configured key cap has been reached
    #[error("Cache capacity exceeded: at most {max} keys may be cached")]
    CapacityExceeded { max: usize },

    /// Key is empty or too long
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
