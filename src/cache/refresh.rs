//! Auto-Refresh Module
//!
//! Periodic, producer-driven replacement of a live entry's value.
//!
//! A refresh task never touches the entry's expiration timer. Its write-back
//! lands only while the key is present; once the key has expired or been
//! deleted, the write is dropped.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};

use crate::cache::store::{Cache, WeakCache};
use crate::tasks;

// == Refresher ==
/// Write-back callback handed to a refresh producer.
///
/// It may be kept and invoked later, from any task or thread. It does not keep
/// the cache alive: a producer that needs the current value should read it
/// through [`Refresher::current`] rather than capture a [`Cache`] clone, which
/// would keep the cache and its refresh task running.
pub struct Refresher<V> {
    cache: WeakCache<V>,
    key: Arc<str>,
}

impl<V> Clone for Refresher<V> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            key: Arc::clone(&self.key),
        }
    }
}

impl<V> std::fmt::Debug for Refresher<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher").field("key", &self.key).finish()
    }
}

impl<V> Refresher<V> {
    /// The key this refresher writes to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stores `value` into the entry currently held under the key.
    ///
    /// Returns false, without error, when the key is no longer present or the
    /// cache is gone.
    pub fn refresh(&self, value: V) -> bool {
        let Some(shared) = self.cache.shared.upgrade() else {
            return false;
        };
        let mut table = shared.table();
        match table.get_mut(&self.key) {
            Some(entry) => {
                entry.value = value;
                trace!(key = %self.key, "Refreshed value");
                true
            }
            None => {
                trace!(key = %self.key, "Dropped refresh for absent key");
                false
            }
        }
    }

    /// Non-owning handle to the cache, for producers that read other keys.
    pub fn cache(&self) -> WeakCache<V> {
        self.cache.clone()
    }
}

impl<V: Clone> Refresher<V> {
    /// Returns the value currently stored under the key, or `None` when the
    /// key is absent or the cache is gone.
    pub fn current(&self) -> Option<V> {
        let shared = self.cache.shared.upgrade()?;
        let table = shared.table();
        table.get(&self.key).map(|entry| entry.value.clone())
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + 'static,
{
    // == Set Auto Refresh ==
    /// Calls `producer` every `interval` (default: the configured
    /// `refresh_interval`) with a [`Refresher`] for `key`.
    ///
    /// Returns false without scheduling anything if auto-refresh is disabled,
    /// the key is empty or absent, or the interval is zero.
    ///
    /// Calling this again for the same key adds another refresh task; all of
    /// them stop when the entry is replaced, deleted, flushed or expires.
    pub fn set_auto_refresh<F>(&self, key: &str, mut producer: F, interval: Option<Duration>) -> bool
    where
        F: FnMut(Refresher<V>) + Send + 'static,
    {
        let config = self.shared.config();
        if !config.auto_refresh || key.is_empty() {
            return false;
        }
        let interval = interval.unwrap_or(config.refresh_interval);
        if interval.is_zero() {
            return false;
        }
        let start = tasks::deadline_after(interval);

        let mut table = self.shared.table();
        let Some(entry) = table.get_mut(key) else {
            return false;
        };

        let refresher = Refresher {
            cache: self.downgrade(),
            key: Arc::from(key),
        };
        let handle = tasks::spawn_periodic(
            &self.shared.runtime,
            start,
            interval,
            move || {
                if refresher.cache.is_dropped() {
                    return ControlFlow::Break(());
                }
                producer(refresher.clone());
                ControlFlow::Continue(())
            },
        );
        entry.refreshers.push(handle);

        debug!(key, interval_ms = interval.as_millis() as u64, "Scheduled auto refresh");
        true
    }
}
