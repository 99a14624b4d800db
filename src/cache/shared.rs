//! Shared Cache
//!
//! Async handle around a [`TtlCache`]: memoizes caller-supplied producers and
//! owns the background sweep.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheConfig, CacheStats, EntryInfo, TtlCache};
use crate::clock::Clock;
use crate::error::Result;
use crate::tasks::{spawn_cleanup_task, CleanupHandle};

// == Shared Cache ==
/// Cloneable handle to one cache. Clones share entries and the sweep task;
/// the sweep stops on [`dispose`](Self::dispose) or when the last clone drops.
#[derive(Debug)]
pub struct SharedCache<T> {
    inner: Arc<RwLock<TtlCache<T>>>,
    cleanup_interval_ms: u64,
    cleanup: Arc<Mutex<Option<CleanupHandle>>>,
}

impl<T> Clone for SharedCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cleanup_interval_ms: self.cleanup_interval_ms,
            cleanup: Arc::clone(&self.cleanup),
        }
    }
}

impl<T> SharedCache<T> {
    fn cleanup_slot(&self) -> MutexGuard<'_, Option<CleanupHandle>> {
        // A poisoned slot still holds a valid Option
        self.cleanup
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cancels the background sweep for every clone. Safe to call more than
    /// once; [`start_cleanup`](SharedCache::start_cleanup) may start it again.
    pub fn dispose(&self) {
        if let Some(cleanup) = self.cleanup_slot().take() {
            cleanup.dispose();
        }
    }

    /// True while a sweep task owned by this cache is running.
    pub fn is_cleanup_running(&self) -> bool {
        self.cleanup_slot()
            .as_ref()
            .is_some_and(|cleanup| !cleanup.is_finished())
    }
}

impl<T> SharedCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a cache on the system clock with no background sweep.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Ok(Self::from_cache(TtlCache::new(config)?))
    }

    /// Creates a cache reading time from `clock`, with no background sweep.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self::from_cache(TtlCache::with_clock(config, clock)?))
    }

    /// Wraps an existing cache.
    pub fn from_cache(cache: TtlCache<T>) -> Self {
        Self {
            cleanup_interval_ms: cache.config().cleanup_interval_ms,
            inner: Arc::new(RwLock::new(cache)),
            cleanup: Arc::new(Mutex::new(None)),
        }
    }

    // == Background Cleanup ==
    /// Starts the periodic sweep at the configured interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_background_cleanup(self) -> Self {
        self.start_cleanup();
        self
    }

    /// Starts the periodic sweep unless one is already running for this
    /// cache, whichever clone started it.
    pub fn start_cleanup(&self) {
        let mut slot = self.cleanup_slot();
        if slot.as_ref().is_some_and(|cleanup| !cleanup.is_finished()) {
            return;
        }
        *slot = Some(spawn_cleanup_task(
            Arc::clone(&self.inner),
            self.cleanup_interval_ms,
        ));
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, or runs `producer` and caches its
    /// output for `ttl` (default TTL if `None`).
    ///
    /// The producer runs at most once per call and never on a hit. A producer
    /// error is returned as is and nothing is cached. No lock is held while the
    /// producer runs, so concurrent misses on one key each run their own
    /// producer.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: &str,
        producer: F,
        ttl: Option<u64>,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        debug!(key = %key, "cache miss, fetching");
        let value = producer().await?;

        self.inner.write().await.set(key, value.clone(), ttl);
        Ok(value)
    }

    // == Operations ==
    /// Stores `value` under `key`; see [`TtlCache::set`].
    pub async fn set(&self, key: impl Into<String>, value: T, ttl: Option<u64>) {
        self.inner.write().await.set(key, value, ttl);
    }

    /// Live value for `key`; an expired entry is dropped.
    pub async fn get(&self, key: &str) -> Option<T> {
        self.inner.write().await.get(key)
    }

    /// Live value and its age/TTL in one lookup.
    pub async fn get_with_info(&self, key: &str) -> Option<(T, EntryInfo)> {
        self.inner.write().await.get_with_info(key)
    }

    /// True if `key` holds a live entry.
    pub async fn has(&self, key: &str) -> bool {
        self.inner.write().await.has(key)
    }

    /// Age and TTL of a live entry.
    pub async fn get_info(&self, key: &str) -> Option<EntryInfo> {
        self.inner.write().await.get_info(key)
    }

    /// Removes `key`. Returns whether it was stored.
    pub async fn delete(&self, key: &str) -> bool {
        self.inner.write().await.delete(key)
    }

    /// Removes every entry.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    /// Stored entries, expired ones included until swept.
    pub async fn size(&self) -> usize {
        self.inner.read().await.size()
    }

    /// Keys in first-insertion order, unfiltered.
    pub async fn keys(&self) -> Vec<String> {
        self.inner.read().await.keys()
    }

    /// Values in first-insertion order, unfiltered.
    pub async fn values(&self) -> Vec<T> {
        self.inner.read().await.values()
    }

    /// Sweeps expired entries now, returning how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        self.inner.write().await.cleanup_expired()
    }

    /// Snapshot of the counters.
    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn shared(config: CacheConfig) -> (SharedCache<String>, ManualClock) {
        let clock = ManualClock::new(0);
        let cache = SharedCache::with_clock(config, Arc::new(clock.clone())).unwrap();
        (cache, clock)
    }

    #[tokio::test]
    async fn test_get_or_fetch_miss_then_hit() {
        let (cache, _) = shared(CacheConfig::default());
        let calls = &AtomicUsize::new(0);

        for _ in 0..3 {
            let value: std::result::Result<String, ()> = cache
                .get_or_fetch(
                    "user:1",
                    || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok("alice".to_string())
                    },
                    None,
                )
                .await;
            assert_eq!(value, Ok("alice".to_string()));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("user:1").await, Some("alice".to_string()));
    }

    #[tokio::test]
    async fn test_get_or_fetch_error_does_not_poison() {
        let (cache, _) = shared(CacheConfig::default());

        let failed: std::result::Result<String, &str> = cache
            .get_or_fetch("k", || async { Err("offline") }, None)
            .await;
        assert_eq!(failed, Err("offline"));
        assert!(!cache.has("k").await);
        assert_eq!(cache.size().await, 0);
    }

    #[tokio::test]
    async fn test_get_or_fetch_refetches_after_expiry() {
        let (cache, clock) = shared(CacheConfig::default());

        let first: std::result::Result<String, ()> = cache
            .get_or_fetch("k", || async { Ok("v1".to_string()) }, Some(100))
            .await;
        assert_eq!(first, Ok("v1".to_string()));

        clock.advance(101);
        let second: std::result::Result<String, ()> = cache
            .get_or_fetch("k", || async { Ok("v2".to_string()) }, Some(100))
            .await;
        assert_eq!(second, Ok("v2".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_misses_each_fetch() {
        let (cache, _) = shared(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let (release_tx, _) = tokio::sync::broadcast::channel::<()>(1);

        let mut handles = Vec::new();
        for _ in 0..2 {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            let mut release = release_tx.subscribe();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(
                        "k",
                        || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            let _ = release.recv().await;
                            Ok::<_, ()>("v".to_string())
                        },
                        None,
                    )
                    .await
            }));
        }

        // Wait until both producers are in flight
        while calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
        release_tx.send(()).unwrap();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok("v".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.size().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_cleanup_and_dispose() {
        let config = CacheConfig::default().with_cleanup_interval(1_000);
        let (cache, clock) = shared(config);
        let cache = cache.with_background_cleanup();

        cache.set("a", "1".to_string(), Some(10)).await;
        clock.advance(11);
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(cache.size().await, 0);

        cache.dispose();
        cache.set("b", "2".to_string(), Some(10)).await;
        clock.advance(11);
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(cache.size().await, 1, "no sweeps after dispose");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_one_sweep() {
        let config = CacheConfig::default().with_cleanup_interval(1_000);
        let (first, clock) = shared(config);
        let second = first.clone();

        first.start_cleanup();
        second.start_cleanup();
        assert!(second.is_cleanup_running());

        first.dispose();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!second.is_cleanup_running());

        second.set("k", "v".to_string(), Some(10)).await;
        clock.advance(11);
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(second.size().await, 1, "no second sweep task survives dispose");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_restarts_after_dispose() {
        let config = CacheConfig::default().with_cleanup_interval(1_000);
        let (cache, clock) = shared(config);

        cache.start_cleanup();
        cache.dispose();
        cache.start_cleanup();
        assert!(cache.is_cleanup_running());

        cache.set("k", "v".to_string(), Some(10)).await;
        clock.advance(11);
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(cache.size().await, 0);

        cache.dispose();
    }
}
