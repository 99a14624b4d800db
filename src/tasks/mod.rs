//! Background Tasks Module
//!
//! Periodic sweeps that remove expired cache entries and stale rate-limit
//! windows. Every task is owned through a [`CleanupHandle`] so it can be
//! cancelled explicitly or by dropping the handle.

mod cleanup;

pub use cleanup::{spawn_cleanup_task, spawn_limiter_cleanup, CleanupHandle, Sweep};

/// Default interval for the shared rate-limiter sweep (5 minutes)
pub const DEFAULT_LIMITER_CLEANUP_INTERVAL_MS: u64 = 5 * 60 * 1000;
