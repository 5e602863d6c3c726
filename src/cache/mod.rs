//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and auto-refresh.

mod deferred;
mod entry;
mod order;
mod refresh;
mod stats;
mod store;
mod table;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use deferred::Deferred;
pub use refresh::Refresher;
pub use stats::CacheStats;
pub use store::{Cache, WeakCache};

pub(crate) use entry::CacheEntry;
pub(crate) use table::Table;
