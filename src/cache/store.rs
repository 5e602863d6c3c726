//! Cache Store Module
//!
//! Main cache engine: owns the table and configuration, and ties expiration
//! and refresh timers to the entry lifecycle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, info, trace};

use crate::cache::{CacheEntry, CacheStats, Table};
use crate::config::{CacheConfig, ConfigPatch};
use crate::error::{CacheError, Result};
use crate::tasks;

/// State shared by every handle to one cache and by its timer tasks.
///
/// Timer tasks hold it weakly. The table is emptied, cancelling every pending
/// timer, when the last [`Cache`] handle is dropped.
pub(crate) struct Shared<V> {
    pub(crate) table: Mutex<Table<V>>,
    pub(crate) config: RwLock<CacheConfig>,
    pub(crate) runtime: Handle,
}

impl<V> Shared<V> {
    pub(crate) fn table(&self) -> MutexGuard<'_, Table<V>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn config(&self) -> CacheConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// == Cache ==
/// In-process key-value cache with per-entry TTL and auto-refresh.
///
/// `Cache` is a cheap handle; clones share the same table.
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use refresh_cache::{Cache, CacheConfig};
///
/// #[tokio::main]
/// async fn main() -> refresh_cache::Result<()> {
///     let cache: Cache<String> = Cache::new(CacheConfig::default());
///     cache.set("greeting", "hello".to_string(), Some(Duration::from_secs(3)))?;
///     assert_eq!(cache.get("greeting")?, Some("hello".to_string()));
///     Ok(())
/// }
/// ```
pub struct Cache<V> {
    pub(crate) shared: Arc<Shared<V>>,
    owner: Arc<Owner<V>>,
}

/// Shared by user-facing handles only. When the last one goes, the table is
/// emptied, which cancels every expiration and refresh task, even if a timer
/// task or an in-flight write-back still holds the shared state.
struct Owner<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Drop for Owner<V> {
    fn drop(&mut self) {
        let removed = self.shared.table().clear();
        if !removed.is_empty() {
            debug!("Cache dropped, cancelled timers of {} entries", removed.len());
        }
    }
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            owner: Arc::clone(&self.owner),
        }
    }
}

// == Weak Cache ==
/// Non-owning handle to a [`Cache`], for code that must not keep the cache
/// alive, such as a refresh producer that reads other keys.
pub struct WeakCache<V> {
    pub(crate) shared: Weak<Shared<V>>,
    owner: Weak<Owner<V>>,
}

impl<V> Clone for WeakCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
            owner: Weak::clone(&self.owner),
        }
    }
}

impl<V> WeakCache<V> {
    /// Returns true once every [`Cache`] handle has been dropped.
    pub fn is_dropped(&self) -> bool {
        self.owner.strong_count() == 0
    }

    /// Returns the cache if any [`Cache`] handle is still alive.
    pub fn upgrade(&self) -> Option<Cache<V>> {
        let owner = self.owner.upgrade()?;
        let shared = self.shared.upgrade()?;
        Some(Cache { shared, owner })
    }
}

impl<V> std::fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("keys", &self.shared.table().live())
            .field("config", &self.shared.config())
            .finish()
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates a cache bound to the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context. Timers and deferred
    /// operations are spawned on that runtime.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_runtime(config, Handle::current())
    }

    /// Creates a cache whose timers and deferred operations run on `runtime`.
    pub fn with_runtime(config: CacheConfig, runtime: Handle) -> Self {
        let shared = Arc::new(Shared {
            table: Mutex::new(Table::new()),
            config: RwLock::new(config),
            runtime,
        });
        Self {
            owner: Arc::new(Owner {
                shared: Arc::clone(&shared),
            }),
            shared,
        }
    }

    /// Returns a handle that does not keep the cache alive.
    pub fn downgrade(&self) -> WeakCache<V> {
        WeakCache {
            shared: Arc::downgrade(&self.shared),
            owner: Arc::downgrade(&self.owner),
        }
    }

    // == Configuration ==
    /// Shallow-merges `patch` onto the current configuration.
    ///
    /// Already scheduled timers keep their durations.
    pub fn configure(&self, patch: ConfigPatch) {
        let mut config = self
            .shared
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        config.merge(patch);
        info!(
            "Cache configured: ttl={:?}, error_or_null={}, auto_refresh={}, refresh_interval={:?}",
            config.ttl, config.error_or_null, config.auto_refresh, config.refresh_interval
        );
    }

    /// Returns a snapshot of the current configuration.
    pub fn config(&self) -> CacheConfig {
        self.shared.config()
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any existing entry wholesale.
    ///
    /// `ttl` falls back to the configured default when `None`; a zero TTL
    /// never expires. Replacing an entry cancels its expiration and refresh
    /// timers.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) -> Result<()> {
        let key = validate_key(key.into())?;
        self.insert(key, value, ttl);
        Ok(())
    }

    // == Get ==
    /// Returns a clone of the value stored under `key`.
    ///
    /// A missing key yields `Ok(None)`, or `Err(NotExistKey)` when
    /// `error_or_null` is enabled. An empty key is always an error.
    pub fn get(&self, key: &str) -> Result<Option<V>> {
        let result = self.lookup(key);
        self.or_null(result)
    }

    // == Delete ==
    /// Removes `key` and cancels its timers.
    ///
    /// Returns `Ok(false)` for a missing key, or `Err(NotExistKey)` when
    /// `error_or_null` is enabled.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let result = self.remove(key);
        self.or_null(result).map(|deleted| deleted.is_some())
    }

    // == Flush All ==
    /// Deletes every present key.
    pub fn flush_all(&self) -> Result<()> {
        let result = self.flush();
        self.or_null(result).map(|_| ())
    }

    // == Exists Key ==
    /// Returns true if `key` is currently present. Never fails.
    pub fn exists_key(&self, key: &str) -> bool {
        self.shared.table().contains(key)
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        CacheStats::new(self.key_count())
    }

    /// Number of keys currently present.
    pub fn key_count(&self) -> usize {
        self.shared.table().live()
    }

    /// All present keys in insertion order.
    pub fn all_keys(&self) -> Vec<String> {
        self.shared.table().keys()
    }

    // == Operations shared with the async surface ==

    pub(crate) fn lookup(&self, key: &str) -> Result<V> {
        let key = validate_key_ref(key)?;
        let table = self.shared.table();
        match table.get(key) {
            Some(entry) => {
                trace!(key, "Cache hit");
                Ok(entry.value.clone())
            }
            None => {
                trace!(key, "Cache miss");
                Err(CacheError::NotExistKey(key.to_string()))
            }
        }
    }

    pub(crate) fn remove(&self, key: &str) -> Result<()> {
        let key = validate_key_ref(key)?;
        let mut table = self.shared.table();
        raw_delete(&mut table, key)
    }

    pub(crate) fn flush(&self) -> Result<()> {
        let mut table = self.shared.table();
        let keys = table.keys();
        let count = keys.len();
        for key in keys {
            raw_delete(&mut table, &key)?;
        }
        debug!("Flushed {} keys", count);
        Ok(())
    }

    pub(crate) fn insert(&self, key: String, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or_else(|| self.shared.config().ttl);
        let mut table = self.shared.table();
        raw_insert(&self.shared, &mut table, key, value, ttl);
    }

    /// Maps a not-found error to `None` unless `error_or_null` is enabled.
    fn or_null<T>(&self, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_exist_key() && !self.shared.config().error_or_null => Ok(None),
            Err(err) => Err(err),
        }
    }
}

// == Table Primitives ==

/// Inserts a fresh entry, first removing any entry stored under `key`.
fn raw_insert<V>(shared: &Arc<Shared<V>>, table: &mut Table<V>, key: String, value: V, ttl: Duration)
where
    V: Send + 'static,
{
    if let Some(mut previous) = table.remove(&key) {
        previous.cancel_timers();
        debug!(key = %key, "Replacing existing entry");
    }

    let generation = table.next_generation();
    let mut entry = CacheEntry::new(value, generation);
    if !ttl.is_zero() {
        let weak = Arc::downgrade(shared);
        let expiry_key = key.clone();
        entry.expires = Some(tasks::spawn_once(
            &shared.runtime,
            tasks::deadline_after(ttl),
            move || expire(weak, &expiry_key, generation),
        ));
    }

    debug!(key = %key, ttl_ms = ttl.as_millis() as u64, "Inserted entry");
    table.insert(key, entry);
}

/// Removes `key` and cancels both of its timers.
fn raw_delete<V>(table: &mut Table<V>, key: &str) -> Result<()> {
    match table.remove(key) {
        Some(mut entry) => {
            entry.cancel_timers();
            debug!(key, "Deleted entry");
            Ok(())
        }
        None => Err(CacheError::NotExistKey(key.to_string())),
    }
}

/// Expiration callback: removes `key` if it still holds the entry the timer
/// was armed for.
fn expire<V>(shared: Weak<Shared<V>>, key: &str, generation: u64) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let mut table = shared.table();
    if table.get(key).map(|entry| entry.generation) != Some(generation) {
        return;
    }
    if let Some(mut entry) = table.remove(key) {
        // This task is the one running; release its handle instead of aborting it.
        if let Some(expires) = entry.expires.take() {
            expires.detach();
        }
        entry.cancel_timers();
        debug!(key, "Entry expired");
    }
}

pub(crate) fn validate_key(key: String) -> Result<String> {
    if key.is_empty() {
        return Err(CacheError::InputArguments("key cannot be empty".to_string()));
    }
    Ok(key)
}

pub(crate) fn validate_key_ref(key: &str) -> Result<&str> {
    if key.is_empty() {
        return Err(CacheError::InputArguments("key cannot be empty".to_string()));
    }
    Ok(key)
}
