//! Cache Module
//!
//! Expiring in-memory storage plus the producer/waiter protocol that lets
//! concurrent readers share one in-flight computation.

mod entry;
mod facade;
mod stats;
mod store;
mod waiters;


// Re-export public types
pub use entry::CacheEntry;
pub use facade::{Cache, Wait};
pub use stats::CacheStats;
pub use store::EntryStore;
pub use waiters::{Registration, WaitRegistry, Waiter};

pub(crate) use facade::State;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
