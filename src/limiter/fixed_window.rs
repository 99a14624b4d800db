//! Fixed Window Rate Limiter
//!
//! Per-key attempt counters over fixed time windows.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::clock::{system_clock, Clock};
use crate::error::{Error, Result};
use crate::limiter::{LimitInfo, RateLimitEntry};
use crate::tasks::Sweep;

// == Rate Limit Config ==
/// Limiter parameters. Both limits are validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    max_attempts: u32,
    window_ms: u64,
    key_prefix: Option<String>,
}

impl RateLimitConfig {
    /// Creates a config allowing `max_attempts` per `window_ms`.
    pub fn new(max_attempts: u32, window_ms: u64) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "max_attempts must be greater than zero".to_string(),
            ));
        }
        if window_ms == 0 {
            return Err(Error::InvalidConfig(
                "window_ms must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_attempts,
            window_ms,
            key_prefix: None,
        })
    }

    /// Namespaces every key as `prefix:key`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Builds a config from values known to be positive.
    pub(crate) const fn preset(max_attempts: u32, window_ms: u64) -> Self {
        Self {
            max_attempts,
            window_ms,
            key_prefix: None,
        }
    }

    // == Accessors ==
    /// Attempts admitted per window.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Window length in milliseconds.
    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Namespace prepended to every key, if any.
    pub fn key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }

    /// Full map key for `key`.
    pub fn full_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

// == Fixed Window Rate Limiter ==
/// Admits at most `max_attempts` calls per key in each window.
///
/// Rejected calls are not counted. The first call after a window ends (or
/// for an unseen key) opens a fresh window and is admitted.
pub struct FixedWindowRateLimiter {
    entries: HashMap<String, RateLimitEntry>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for FixedWindowRateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedWindowRateLimiter")
            .field("tracked_keys", &self.entries.len())
            .field("config", &self.config)
            .finish()
    }
}

impl FixedWindowRateLimiter {
    // == Constructors ==
    /// Creates a limiter on the system clock.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, system_clock())
    }

    /// Creates a limiter reading time from `clock`.
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            clock,
        }
    }

    // == Can Execute ==
    /// Records an attempt for `key` and reports whether it was admitted.
    pub fn can_execute(&mut self, key: &str) -> bool {
        self.check(key).is_ok()
    }

    // == Check ==
    /// Like [`can_execute`](Self::can_execute), but an admission returns the
    /// updated window and a rejection carries the key and the wait until the
    /// window expires.
    pub fn check(&mut self, key: &str) -> Result<LimitInfo> {
        let now = self.clock.now_ms();
        let full_key = self.config.full_key(key);

        let live = self
            .entries
            .get(&full_key)
            .copied()
            .filter(|entry| !entry.is_expired(now));

        match live {
            None => {
                let entry = RateLimitEntry::open(now, self.config.window_ms);
                self.entries.insert(full_key, entry);
                Ok(entry.info(self.config.max_attempts))
            }
            Some(mut entry) if entry.attempts < self.config.max_attempts => {
                entry.attempts += 1;
                self.entries.insert(full_key, entry);
                Ok(entry.info(self.config.max_attempts))
            }
            Some(entry) => {
                let retry_after_ms = entry.retry_after_ms(now);
                debug!(key = %full_key, retry_after_ms, "rate limit exceeded");
                Err(Error::RateLimitExceeded {
                    key: full_key,
                    retry_after_ms,
                })
            }
        }
    }

    // == Get Limit Info ==
    /// Current window for `key`, or `None` if there is no live window.
    ///
    /// Never mutates: an expired window is left for `cleanup` to remove.
    pub fn get_limit_info(&self, key: &str) -> Option<LimitInfo> {
        let now = self.clock.now_ms();
        self.entries
            .get(&self.config.full_key(key))
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.info(self.config.max_attempts))
    }

    // == Reset ==
    /// Forgets `key`'s window. Returns whether one was tracked.
    pub fn reset(&mut self, key: &str) -> bool {
        self.entries.remove(&self.config.full_key(key)).is_some()
    }

    // == Clear ==
    /// Forgets every window.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // == Cleanup ==
    /// Removes every expired window, returning how many were dropped.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    // == Size ==
    /// Number of tracked windows, expired ones included until `cleanup`.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no window is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parameters this limiter was built with.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

impl Sweep for FixedWindowRateLimiter {
    const LABEL: &'static str = "rate_limiter";

    fn sweep(&mut self) -> usize {
        self.cleanup()
    }
}
