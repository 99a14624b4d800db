//! Cache Store Module
//!
//! Main cache engine: an insertion-ordered map of entries with TTL expiration
//! and a capacity bound enforced by FIFO eviction.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::cache::{
    CacheEntry, CacheStats, EntryInfo, DEFAULT_CLEANUP_INTERVAL_MS, DEFAULT_MAX_SIZE,
    DEFAULT_TTL_MS,
};
use crate::clock::{system_clock, Clock};
use crate::error::{Error, Result};
use crate::tasks::Sweep;

// == Cache Config ==
/// Construction parameters for a [`TtlCache`]. Fixed once the cache is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied when `set` is called without one
    pub default_ttl_ms: u64,
    /// Maximum number of entries held at once
    pub max_size: usize,
    /// Interval between background sweeps
    pub cleanup_interval_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: DEFAULT_TTL_MS,
            max_size: DEFAULT_MAX_SIZE,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
        }
    }
}

impl CacheConfig {
    // == Builders ==
    /// Sets the TTL used when `set` gets none.
    pub fn with_default_ttl(mut self, ttl_ms: u64) -> Self {
        self.default_ttl_ms = ttl_ms;
        self
    }

    /// Sets the entry capacity.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the background sweep interval.
    pub fn with_cleanup_interval(mut self, interval_ms: u64) -> Self {
        self.cleanup_interval_ms = interval_ms;
        self
    }

    /// Rejects a zero capacity or a zero sweep interval.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::InvalidConfig(
                "max_size must be greater than zero".to_string(),
            ));
        }
        if self.cleanup_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "cleanup_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// == TTL Cache ==
/// Key-value store with per-entry expiration and a bounded entry count.
///
/// Expiration is lazy: `get`, `has` and `get_info` drop an expired entry when
/// they find one, while `size`, `keys` and `values` report the map as it is
/// until [`TtlCache::cleanup_expired`] runs.
///
/// When a new key arrives at capacity, the entry inserted first is evicted.
/// Overwriting a key replaces its value and timestamp but keeps its place in
/// that order, so eviction is FIFO rather than LRU.
pub struct TtlCache<T> {
    /// Entries in first-insertion order
    entries: IndexMap<String, CacheEntry<T>>,
    stats: CacheStats,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl<T> fmt::Debug for TtlCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("len", &self.entries.len())
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<T> TtlCache<T> {
    // == Constructor ==
    /// Creates a cache on the system clock.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, system_clock())
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            entries: IndexMap::with_capacity(config.max_size),
            stats: CacheStats::new(),
            config,
            clock,
        })
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl` milliseconds (default TTL if `None`).
    ///
    /// A new key arriving while the cache is full evicts the oldest-inserted
    /// entry first. An existing key is overwritten in place.
    pub fn set(&mut self, key: impl Into<String>, value: T, ttl: Option<u64>) {
        let key = key.into();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_size {
            if let Some((evicted, _)) = self.entries.shift_remove_index(0) {
                debug!(key = %evicted, "evicted oldest cache entry");
                self.stats.record_eviction();
            }
        }

        let now = self.clock.now_ms();
        let ttl = ttl.unwrap_or(self.config.default_ttl_ms);
        self.entries.insert(key, CacheEntry::new(value, now, ttl));

        self.stats.set_total_entries(self.entries.len());
    }

    /// Looks up a live entry, dropping it if it has expired.
    fn live_entry(&mut self, key: &str) -> Option<&CacheEntry<T>> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.entries.shift_remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            self.stats.set_total_entries(self.entries.len());
            debug!(key = %key, "dropped expired cache entry on read");
            return None;
        }

        self.stats.record_hit();
        self.entries.get(key)
    }

    // == Has ==
    /// True if `key` holds a live value. Drops the entry if it has expired.
    pub fn has(&mut self, key: &str) -> bool {
        self.live_entry(key).is_some()
    }

    // == Get Info ==
    /// Age and TTL of a live entry. Drops the entry if it has expired.
    pub fn get_info(&mut self, key: &str) -> Option<EntryInfo> {
        let now = self.clock.now_ms();
        self.live_entry(key).map(|entry| entry.info(now))
    }

    // == Delete ==
    /// Removes `key`, returning whether an entry (live or not yet swept) was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.shift_remove(key).is_some();
        if removed {
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats.set_total_entries(0);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_expired(now));

        let removed = before - self.entries.len();
        self.stats.record_expirations(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Size ==
    /// Number of entries in the map, including expired ones not yet swept.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Same as [`size`](Self::size).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored, expired or not.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Keys ==
    /// All keys in first-insertion order, expired or not.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Config ==
    /// Parameters this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl<T: Clone> TtlCache<T> {
    // == Get ==
    /// Returns the value for `key` if present and not expired.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<T> {
        self.live_entry(key).map(|entry| entry.value.clone())
    }

    /// Value and age/TTL of a live entry in a single lookup.
    pub fn get_with_info(&mut self, key: &str) -> Option<(T, EntryInfo)> {
        let now = self.clock.now_ms();
        self.live_entry(key)
            .map(|entry| (entry.value.clone(), entry.info(now)))
    }

    // == Values ==
    /// All stored values in first-insertion order, expired or not.
    ///
    /// Callers that must not see stale data should sweep first or go
    /// through `get`.
    pub fn values(&self) -> Vec<T> {
        self.entries.values().map(|entry| entry.value.clone()).collect()
    }
}

impl<T: Send + Sync> Sweep for TtlCache<T> {
    const LABEL: &'static str = "cache";

    fn sweep(&mut self) -> usize {
        self.cleanup_expired()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn test_cache(max_size: usize, default_ttl_ms: u64) -> (TtlCache<String>, ManualClock) {
        let clock = ManualClock::new(1_000_000);
        let config = CacheConfig::default()
            .with_max_size(max_size)
            .with_default_ttl(default_ttl_ms);
        let cache = TtlCache::with_clock(config, Arc::new(clock.clone())).unwrap();
        (cache, clock)
    }

    #[test]
    fn test_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl_ms, 300_000);
        assert_eq!(config.max_size, 100);
        assert_eq!(config.cleanup_interval_ms, 60_000);
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let result = TtlCache::<String>::new(CacheConfig::default().with_max_size(0));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_config_rejects_zero_interval() {
        let result = TtlCache::<String>::new(CacheConfig::default().with_cleanup_interval(0));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_store_set_and_get() {
        let (mut cache, _) = test_cache(100, 300_000);

        cache.set("key1", "value1".to_string(), None);

        assert_eq!(cache.get("key1"), Some("value1".to_string()));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let (mut cache, _) = test_cache(100, 300_000);
        assert_eq!(cache.get("nonexistent"), None);
        assert!(!cache.has("nonexistent"));
    }

    #[test]
    fn test_store_overwrite_keeps_position() {
        let (mut cache, _) = test_cache(100, 300_000);

        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);
        cache.set("a", "3".to_string(), None);

        assert_eq!(cache.get("a"), Some("3".to_string()));
        assert_eq!(cache.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn test_store_overwrite_resets_timestamp() {
        let (mut cache, clock) = test_cache(100, 1_000);

        cache.set("key", "old".to_string(), None);
        clock.advance(900);
        cache.set("key", "new".to_string(), Some(500));
        clock.advance(400);

        let info = cache.get_info("key").unwrap();
        assert_eq!(info.age_ms, 400);
        assert_eq!(info.ttl_ms, 500);
    }

    #[test]
    fn test_store_ttl_expiration_deletes_on_read() {
        let (mut cache, clock) = test_cache(100, 300_000);

        cache.set("key1", "value1".to_string(), Some(1_000));
        assert!(cache.has("key1"));

        clock.advance(1_001);

        assert_eq!(cache.size(), 1, "unswept entries still count toward size");
        assert_eq!(cache.get("key1"), None);
        assert_eq!(cache.size(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_store_has_and_get_info_expire_too() {
        let (mut cache, clock) = test_cache(100, 100);

        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);
        clock.advance(101);

        assert!(!cache.has("a"));
        assert!(cache.get_info("b").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_store_fifo_eviction() {
        let (mut cache, _) = test_cache(3, 300_000);

        cache.set("key1", "value1".to_string(), None);
        cache.set("key2", "value2".to_string(), None);
        cache.set("key3", "value3".to_string(), None);

        // Reading key1 does not protect it: eviction ignores access recency
        assert!(cache.get("key1").is_some());
        cache.set("key4", "value4".to_string(), None);

        assert_eq!(cache.size(), 3);
        assert_eq!(cache.get("key1"), None);
        assert!(cache.has("key2"));
        assert!(cache.has("key3"));
        assert!(cache.has("key4"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_store_overwrite_at_capacity_does_not_evict() {
        let (mut cache, _) = test_cache(2, 300_000);

        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);
        cache.set("b", "3".to_string(), None);

        assert_eq!(cache.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_store_eviction_may_pick_expired_unswept_entry() {
        let (mut cache, clock) = test_cache(2, 300_000);

        cache.set("short", "1".to_string(), Some(10));
        cache.set("long", "2".to_string(), None);
        clock.advance(50);
        cache.set("new", "3".to_string(), None);

        assert_eq!(cache.keys(), vec!["long".to_string(), "new".to_string()]);
    }

    #[test]
    fn test_store_delete() {
        let (mut cache, clock) = test_cache(100, 10);

        cache.set("key1", "value1".to_string(), None);
        assert!(cache.delete("key1"));
        assert!(!cache.delete("key1"));

        // Expired but unswept entries still count as present
        cache.set("key2", "value2".to_string(), None);
        clock.advance(1_000);
        assert!(cache.delete("key2"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_store_delete_preserves_order() {
        let (mut cache, _) = test_cache(100, 300_000);

        for key in ["a", "b", "c", "d"] {
            cache.set(key, key.to_uppercase(), None);
        }
        cache.delete("b");

        assert_eq!(
            cache.keys(),
            vec!["a".to_string(), "c".to_string(), "d".to_string()]
        );
        assert_eq!(
            cache.values(),
            vec!["A".to_string(), "C".to_string(), "D".to_string()]
        );
    }

    #[test]
    fn test_store_clear() {
        let (mut cache, _) = test_cache(100, 300_000);

        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);
        cache.clear();

        assert_eq!(cache.size(), 0);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_keys_and_values_do_not_filter_expired() {
        let (mut cache, clock) = test_cache(100, 300_000);

        cache.set("stale", "old".to_string(), Some(10));
        cache.set("fresh", "new".to_string(), None);
        clock.advance(100);

        assert_eq!(cache.keys().len(), 2);
        assert_eq!(cache.values(), vec!["old".to_string(), "new".to_string()]);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let (mut cache, clock) = test_cache(100, 300_000);

        cache.set("key1", "value1".to_string(), Some(1_000));
        cache.set("key2", "value2".to_string(), Some(10_000));

        clock.advance(1_500);

        let removed = cache.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(cache.size(), 1);
        assert!(cache.has("key2"));
    }

    #[test]
    fn test_store_stats() {
        let (mut cache, _) = test_cache(100, 300_000);

        cache.set("key1", "value1".to_string(), None);
        cache.get("key1");
        cache.get("nonexistent");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_get_with_info() {
        let (mut cache, clock) = test_cache(100, 1_000);

        cache.set("k", "v".to_string(), None);
        clock.advance(250);

        let (value, info) = cache.get_with_info("k").unwrap();
        assert_eq!(value, "v");
        assert_eq!(info.age_ms, 250);
        assert_eq!(info.ttl_ms, 1_000);
    }

    #[test]
    fn test_sweep_delegates_to_cleanup() {
        let (mut cache, clock) = test_cache(100, 5);

        cache.set("a", "1".to_string(), None);
        clock.advance(6);

        assert_eq!(Sweep::sweep(&mut cache), 1);
        assert_eq!(<TtlCache<String> as Sweep>::LABEL, "cache");
    }
}
