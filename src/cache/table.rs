//! Table Module
//!
//! Key-to-entry mapping with insertion order and a live-entry counter.
//! Only the cache engine mutates a table.

use std::collections::HashMap;

use crate::cache::entry::CacheEntry;
use crate::cache::order::KeyOrder;

// == Table ==
#[derive(Debug)]
pub struct Table<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: KeyOrder,
    /// Live-entry counter, kept equal to `entries.len()`
    live: usize,
    next_generation: u64,
}

impl<V> Default for Table<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Table<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: KeyOrder::new(),
            live: 0,
            next_generation: 0,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry<V>> {
        self.entries.get_mut(key)
    }

    /// Returns a generation number not yet used by any entry of this table.
    pub fn next_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;
        generation
    }

    // == Insert ==
    /// Stores an entry under a key that is not present.
    ///
    /// Callers remove any existing entry first so its timers get cancelled.
    pub fn insert(&mut self, key: String, entry: CacheEntry<V>) {
        self.order.push(entry.generation, &key);
        match self.entries.insert(key, entry) {
            Some(previous) => self.order.remove(previous.generation),
            None => self.live += 1,
        }
        self.check_counter();
    }

    // == Remove ==
    /// Removes and returns the entry stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(entry.generation);
        self.live -= 1;
        self.check_counter();
        Some(entry)
    }

    // == Clear ==
    /// Removes every entry, returning them for timer cancellation.
    pub fn clear(&mut self) -> Vec<CacheEntry<V>> {
        self.order.clear();
        self.live = 0;
        let entries = self.entries.drain().map(|(_, entry)| entry).collect();
        self.check_counter();
        entries
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.order.keys()
    }

    pub fn live(&self) -> usize {
        self.live
    }

    fn check_counter(&self) {
        debug_assert_eq!(self.live, self.entries.len());
        debug_assert_eq!(self.live, self.order.len());
    }
}
