//! Response DTOs for the inspection API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, EntryInfo};
use crate::limiter::LimitInfo;

/// Response body for `GET /caches/:cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryResponse {
    pub cache: String,
    pub key: String,
    pub value: Value,
    /// Milliseconds since the value was written
    pub age_ms: u64,
    /// Configured lifetime in milliseconds
    pub ttl_ms: u64,
}

impl CacheEntryResponse {
    pub fn new(cache: impl Into<String>, key: impl Into<String>, value: Value, info: EntryInfo) -> Self {
        Self {
            cache: cache.into(),
            key: key.into(),
            value,
            age_ms: info.age_ms,
            ttl_ms: info.ttl_ms,
        }
    }
}

/// Response body for `PUT /caches/:cache/:key`
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    pub cache: String,
    pub key: String,
}

impl SetResponse {
    pub fn new(cache: impl Into<String>, key: impl Into<String>) -> Self {
        let cache = cache.into();
        let key = key.into();
        Self {
            message: format!("Key '{}' set in '{}'", key, cache),
            cache,
            key,
        }
    }
}

/// Response body for the DELETE endpoints
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
}

impl DeleteResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for `GET /caches/:cache`
#[derive(Debug, Clone, Serialize)]
pub struct CacheKeysResponse {
    pub cache: String,
    /// Keys in insertion order, including expired ones not yet swept
    pub keys: Vec<String>,
}

/// Per-cache section of the stats response
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsBody {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsBody {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
        }
    }
}

/// Per-limiter section of the stats response
#[derive(Debug, Clone, Serialize)]
pub struct LimiterStatsBody {
    pub max_attempts: u32,
    pub window_ms: u64,
    /// Windows currently tracked, expired ones included until swept
    pub tracked_keys: usize,
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsResponse {
    pub caches: BTreeMap<String, CacheStatsBody>,
    pub limiters: BTreeMap<String, LimiterStatsBody>,
}

/// Response body for an admitted `POST /limits/:action/:key`
#[derive(Debug, Clone, Serialize)]
pub struct AttemptResponse {
    pub action: String,
    pub key: String,
    pub allowed: bool,
    pub attempts: u32,
    pub remaining: u32,
    /// Window end (Unix milliseconds)
    pub reset_time: u64,
}

impl AttemptResponse {
    pub fn allowed(action: impl Into<String>, key: impl Into<String>, info: LimitInfo) -> Self {
        Self {
            action: action.into(),
            key: key.into(),
            allowed: true,
            attempts: info.attempts,
            remaining: info.remaining,
            reset_time: info.reset_time,
        }
    }
}

/// Response body for `GET /limits/:action/:key`
#[derive(Debug, Clone, Serialize)]
pub struct LimitInfoResponse {
    pub action: String,
    pub key: String,
    #[serde(flatten)]
    pub info: LimitInfo,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
