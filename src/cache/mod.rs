//! Cache Module
//!
//! Provides an in-memory cache with per-entry TTL expiration and bounded
//! capacity. Eviction is FIFO by first insertion.

mod entry;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, EntryInfo};
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::{CacheConfig, TtlCache};

// == Public Constants ==
/// Default time-to-live for entries set without an explicit TTL (5 minutes)
pub const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;

/// Default maximum number of entries
pub const DEFAULT_MAX_SIZE: usize = 100;

/// Default interval between background sweeps (1 minute)
pub const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 60 * 1000;
