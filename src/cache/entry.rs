//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// A single cached value with the time it was stored and how long it lives.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Lifetime in milliseconds, measured from `stored_at`
    pub ttl: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry stored at `now` with the given TTL.
    pub fn new(value: T, now: u64, ttl: u64) -> Self {
        Self {
            value,
            stored_at: now,
            ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Expiry is strict: an entry whose age equals its TTL is still live,
    /// one millisecond later it is gone. A clock that moved backwards
    /// yields age zero.
    pub fn is_expired(&self, now: u64) -> bool {
        self.age(now) > self.ttl
    }

    // == Age ==
    /// Milliseconds since the entry was written.
    pub fn age(&self, now: u64) -> u64 {
        now.saturating_sub(self.stored_at)
    }

    // == Time To Live ==
    /// Returns remaining lifetime in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        self.ttl.saturating_sub(self.age(now))
    }

    /// Snapshot of age and configured TTL.
    pub fn info(&self, now: u64) -> EntryInfo {
        EntryInfo {
            age_ms: self.age(now),
            ttl_ms: self.ttl,
        }
    }
}

// == Entry Info ==
/// Age and configured TTL of a live entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    pub age_ms: u64,
    pub ttl_ms: u64,
}
