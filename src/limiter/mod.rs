//! Rate Limiter Module
//!
//! Fixed-window, per-key admission control. Each key may run at most
//! `max_attempts` times per window; the call that finds no live window opens
//! a new one.
//!
//! Bursts straddling a window boundary can reach `2 * max_attempts` in a
//! short span. That is inherent to fixed windows.

mod fixed_window;
mod presets;
mod shared;
mod window;


pub use fixed_window::{FixedWindowRateLimiter, RateLimitConfig};
pub use presets::LimitAction;
pub use shared::SharedRateLimiter;
pub use window::{LimitInfo, RateLimitEntry};
