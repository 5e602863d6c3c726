//! Cache Statistics Module

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of the cache's live-entry counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of keys currently present
    pub keys: usize,
}

impl CacheStats {
    pub fn new(keys: usize) -> Self {
        Self { keys }
    }
}
