//! Inflight Cache - an in-process TTL cache
//!
//! Caches the results of slow lookups and lets concurrent callers wait for a
//! value another caller is already computing instead of recomputing it.

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{Cache, CacheStats, Wait};
pub use config::CacheOptions;
pub use error::{CacheError, Result};
