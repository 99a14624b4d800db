//! ttl_gate - In-memory TTL caches and fixed-window rate limiters
//!
//! Provides a capacity-bounded cache with per-entry expiration and
//! first-in-first-out eviction, a per-key fixed-window rate limiter with
//! named presets, background sweeps for both, and a small HTTP API for
//! inspecting them.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod limiter;
pub mod models;
pub mod registry;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheConfig, SharedCache, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use limiter::{FixedWindowRateLimiter, LimitAction, RateLimitConfig, SharedRateLimiter};
pub use registry::{CacheDomain, Registry};
pub use tasks::{spawn_cleanup_task, CleanupHandle};
