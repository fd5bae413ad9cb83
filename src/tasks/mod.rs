//! Background Tasks Module
//!
//! Contains the tasks a cache instance runs alongside its callers.
//!
//! # Tasks
//! - Eviction sweep: removes expired, unwaited entries at a fixed interval

mod evictor;

pub(crate) use evictor::spawn_evictor;
