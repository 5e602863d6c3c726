//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and their timers.

use crate::tasks::TimerHandle;

// == Cache Entry ==
/// A stored value together with the timers scheduled for it.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Distinguishes this entry from earlier entries stored under the same key
    pub generation: u64,
    /// Pending expiration, None = never expires
    pub expires: Option<TimerHandle>,
    /// Active refresh tasks, in the order they were scheduled
    pub refreshers: Vec<TimerHandle>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry with no timers attached.
    pub fn new(value: V, generation: u64) -> Self {
        Self {
            value,
            generation,
            expires: None,
            refreshers: Vec::new(),
        }
    }

    /// Returns true if an expiration timer is armed for this entry.
    #[allow(dead_code)]
    pub fn has_expiry(&self) -> bool {
        self.expires.as_ref().is_some_and(TimerHandle::is_active)
    }

    /// Returns true if at least one refresh task is attached.
    #[allow(dead_code)]
    pub fn is_refreshing(&self) -> bool {
        self.refreshers.iter().any(TimerHandle::is_active)
    }

    // == Cancel Timers ==
    /// Cancels the expiration timer and every refresh task.
    ///
    /// Safe to call repeatedly.
    pub fn cancel_timers(&mut self) {
        if let Some(expires) = self.expires.as_mut() {
            expires.cancel();
        }
        self.expires = None;
        for refresher in self.refreshers.iter_mut() {
            refresher.cancel();
        }
        self.refreshers.clear();
    }
}
