//! Rate Limit Window Module
//!
//! State of one key's current window.

use serde::Serialize;

// == Rate Limit Entry ==
/// Attempts recorded in the current window and when that window ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// Admitted attempts in this window
    pub attempts: u32,
    /// Window end (Unix milliseconds)
    pub reset_time: u64,
}

impl RateLimitEntry {
    /// Opens a window at `now` with its first attempt already counted.
    pub fn open(now: u64, window_ms: u64) -> Self {
        Self {
            attempts: 1,
            reset_time: now.saturating_add(window_ms),
        }
    }

    /// A window is over once `now` is strictly past its reset time.
    pub fn is_expired(&self, now: u64) -> bool {
        now > self.reset_time
    }

    /// Milliseconds until the first instant the window counts as expired.
    pub fn retry_after_ms(&self, now: u64) -> u64 {
        if self.is_expired(now) {
            0
        } else {
            self.reset_time - now + 1
        }
    }

    /// Snapshot of this window against `max_attempts`.
    pub fn info(&self, max_attempts: u32) -> LimitInfo {
        LimitInfo {
            attempts: self.attempts,
            remaining: max_attempts.saturating_sub(self.attempts),
            reset_time: self.reset_time,
        }
    }
}

// == Limit Info ==
/// Read-only view of a live window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitInfo {
    pub attempts: u32,
    pub remaining: u32,
    pub reset_time: u64,
}
