//! Key Order Module
//!
//! Tracks insertion order so key enumeration is stable.

use std::collections::BTreeMap;

// == Key Order ==
/// Keys indexed by the generation of the entry stored under them.
///
/// Generations only grow, so iterating by generation yields keys oldest
/// insertion first. A re-inserted key gets a new generation and moves to the
/// back. Push and remove are O(log n).
#[derive(Debug, Default)]
pub struct KeyOrder {
    order: BTreeMap<u64, String>,
}

impl KeyOrder {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
        }
    }

    // == Push ==
    /// Records `key` as inserted with `generation`.
    pub fn push(&mut self, generation: u64, key: &str) {
        self.order.insert(generation, key.to_string());
    }

    // == Remove ==
    /// Forgets the insertion recorded under `generation`.
    pub fn remove(&mut self, generation: u64) {
        self.order.remove(&generation);
    }

    /// Returns the keys, oldest first.
    pub fn keys(&self) -> Vec<String> {
        self.order.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
