//! Asynchronous Surface
//!
//! Async counterparts of the synchronous operations. Each one validates its
//! arguments immediately, then runs as a task spawned on the cache's runtime,
//! so it never completes synchronously with the call. Outcomes, including
//! not-found, are always reported through the returned [`Deferred`];
//! `error_or_null` does not apply here.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::cache::store::{validate_key, validate_key_ref, Cache};
use crate::error::{CacheError, Result};

// == Deferred ==
/// A cache operation scheduled on the runtime.
///
/// Dropping it does not cancel the operation.
#[must_use = "the operation runs regardless, but its outcome is only observable by awaiting"]
#[derive(Debug)]
pub struct Deferred<T> {
    handle: JoinHandle<Result<T>>,
    runtime: Handle,
}

impl<T: Send + 'static> Deferred<T> {
    /// Invokes `callback` with the outcome exactly once, from a runtime task.
    pub fn on_complete<F>(self, callback: F)
    where
        F: FnOnce(Result<T>) + Send + 'static,
    {
        let runtime = self.runtime.clone();
        runtime.spawn(async move {
            callback(self.await);
        });
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().handle).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(join_err)) => Poll::Ready(Err(CacheError::Internal(format!(
                "deferred operation failed: {}",
                join_err
            )))),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<V> Cache<V>
where
    V: Clone + Send + 'static,
{
    fn defer<T, F>(&self, op: F) -> Deferred<T>
    where
        T: Send + 'static,
        F: FnOnce(&Cache<V>) -> Result<T> + Send + 'static,
    {
        let cache = self.clone();
        let runtime = self.shared.runtime.clone();
        Deferred {
            handle: runtime.spawn(async move { op(&cache) }),
            runtime,
        }
    }

    // == Set Async ==
    /// Deferred [`Cache::set`]. The default TTL is the one configured when
    /// this is called, not when the write runs.
    pub fn set_async(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) -> Result<Deferred<()>> {
        let key = validate_key(key.into())?;
        let ttl = Some(ttl.unwrap_or_else(|| self.shared.config().ttl));
        trace!(key = %key, "Deferring set");
        Ok(self.defer(move |cache| {
            cache.insert(key, value, ttl);
            Ok(())
        }))
    }

    // == Get Async ==
    /// Deferred [`Cache::get`]. A missing key resolves to `Err(NotExistKey)`.
    pub fn get_async(&self, key: &str) -> Result<Deferred<V>> {
        let key = validate_key_ref(key)?.to_string();
        Ok(self.defer(move |cache| cache.lookup(&key)))
    }

    // == Delete Async ==
    /// Deferred [`Cache::delete`]. A missing key resolves to `Err(NotExistKey)`.
    pub fn delete_async(&self, key: &str) -> Result<Deferred<()>> {
        let key = validate_key_ref(key)?.to_string();
        Ok(self.defer(move |cache| cache.remove(&key)))
    }

    // == Flush All Async ==
    /// Deferred [`Cache::flush_all`].
    pub fn flush_all_async(&self) -> Deferred<()> {
        self.defer(|cache| cache.flush())
    }
}
