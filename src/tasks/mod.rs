//! Background Tasks Module
//!
//! Contains the timer tasks scheduled on behalf of cache entries.
//!
//! # Tasks
//! - Expiration: one-shot removal of a key once its TTL elapses
//! - Refresh: periodic invocation of an entry's value producer

mod timer;

pub use timer::{deadline_after, spawn_once, spawn_periodic, TimerHandle, MAX_DELAY};
