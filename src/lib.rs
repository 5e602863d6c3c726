//! Refresh Cache - an in-process key-value cache
//!
//! Entries carry an optional time-to-live and can periodically recompute their
//! own value through a caller-supplied producer.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats, Deferred, Refresher, WeakCache};
pub use config::{CacheConfig, ConfigPatch};
pub use error::{CacheError, Result};
