//! Shared Rate Limiter
//!
//! Async handle around a [`FixedWindowRateLimiter`] that gates caller-supplied
//! futures.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::limiter::{FixedWindowRateLimiter, LimitInfo, RateLimitConfig};

// == Shared Rate Limiter ==
/// Cloneable handle; clones share the same windows.
#[derive(Debug, Clone)]
pub struct SharedRateLimiter {
    inner: Arc<RwLock<FixedWindowRateLimiter>>,
}

impl SharedRateLimiter {
    /// Creates a limiter on the system clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::from_limiter(FixedWindowRateLimiter::new(config))
    }

    /// Creates a limiter reading time from `clock`.
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self::from_limiter(FixedWindowRateLimiter::with_clock(config, clock))
    }

    /// Wraps an existing limiter.
    pub fn from_limiter(limiter: FixedWindowRateLimiter) -> Self {
        Self {
            inner: Arc::new(RwLock::new(limiter)),
        }
    }

    pub(crate) fn inner(&self) -> Arc<RwLock<FixedWindowRateLimiter>> {
        Arc::clone(&self.inner)
    }

    // == Admission ==
    /// Records an attempt for `key` and reports whether it was admitted.
    pub async fn can_execute(&self, key: &str) -> bool {
        self.inner.write().await.can_execute(key)
    }

    /// Records an attempt and returns the updated window, read under the
    /// same lock as the admission.
    pub async fn check(&self, key: &str) -> Result<LimitInfo> {
        self.inner.write().await.check(key)
    }

    // == Execute ==
    /// Runs `f` if `key` is admitted, otherwise fails with
    /// [`Error::RateLimitExceeded`] converted into the caller's error type.
    ///
    /// Whatever `f` returns is passed through untouched.
    pub async fn execute<F, Fut, R, E>(&self, key: &str, f: F) -> std::result::Result<R, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<R, E>>,
        E: From<Error>,
    {
        self.execute_or_else(key, f, || {}).await
    }

    /// Like [`execute`](Self::execute), calling `on_limit_exceeded` once
    /// before failing when the key is throttled.
    pub async fn execute_or_else<F, Fut, R, E, C>(
        &self,
        key: &str,
        f: F,
        on_limit_exceeded: C,
    ) -> std::result::Result<R, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<R, E>>,
        E: From<Error>,
        C: FnOnce(),
    {
        // The guard is dropped before `f` is awaited
        let admission = self.inner.write().await.check(key);

        if let Err(err) = admission {
            warn!(key = %key, "action rejected: {}", err);
            on_limit_exceeded();
            return Err(E::from(err));
        }

        f().await
    }

    // == Inspection ==
    /// Current window for `key`, if live.
    pub async fn get_limit_info(&self, key: &str) -> Option<LimitInfo> {
        self.inner.read().await.get_limit_info(key)
    }

    /// Forgets `key`'s window. Returns whether one was tracked.
    pub async fn reset(&self, key: &str) -> bool {
        self.inner.write().await.reset(key)
    }

    /// Forgets every window.
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    /// Removes expired windows, returning how many were dropped.
    pub async fn cleanup(&self) -> usize {
        self.inner.write().await.cleanup()
    }

    /// Tracked windows, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// True when no window is tracked.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Copy of the limiter parameters.
    pub async fn config(&self) -> RateLimitConfig {
        self.inner.read().await.config().clone()
    }
}
