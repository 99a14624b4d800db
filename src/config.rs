//! Configuration Module
//!
//! Handles loading service configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::{CacheConfig, DEFAULT_CLEANUP_INTERVAL_MS};
use crate::registry::CacheDomain;
use crate::tasks::DEFAULT_LIMITER_CLEANUP_INTERVAL_MS;

/// Capacity and default TTL for one domain cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub max_size: usize,
    pub ttl_ms: u64,
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Interval between cache sweeps in milliseconds
    pub cleanup_interval_ms: u64,
    /// Interval between rate-limiter sweeps in milliseconds
    pub limiter_cleanup_interval_ms: u64,
    pub user_cache: CacheSettings,
    pub sharing_cache: CacheSettings,
    pub market_cache: CacheSettings,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL_MS` - Cache sweep interval (default: 60000)
    /// - `LIMITER_CLEANUP_INTERVAL_MS` - Limiter sweep interval (default: 300000)
    /// - `USER_CACHE_MAX_SIZE` / `USER_CACHE_TTL_MS` (default: 200 / 600000)
    /// - `SHARING_CACHE_MAX_SIZE` / `SHARING_CACHE_TTL_MS` (default: 100 / 300000)
    /// - `MARKET_CACHE_MAX_SIZE` / `MARKET_CACHE_TTL_MS` (default: 50 / 120000)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    ///
    /// Missing or unparsable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let settings = |prefix: &str, fallback: CacheSettings| CacheSettings {
            max_size: read_parsed(&lookup, &format!("{}_MAX_SIZE", prefix), fallback.max_size),
            ttl_ms: read_parsed(&lookup, &format!("{}_TTL_MS", prefix), fallback.ttl_ms),
        };

        Self {
            server_port: read_parsed(&lookup, "SERVER_PORT", defaults.server_port),
            cleanup_interval_ms: read_parsed(
                &lookup,
                "CLEANUP_INTERVAL_MS",
                defaults.cleanup_interval_ms,
            ),
            limiter_cleanup_interval_ms: read_parsed(
                &lookup,
                "LIMITER_CLEANUP_INTERVAL_MS",
                defaults.limiter_cleanup_interval_ms,
            ),
            user_cache: settings("USER_CACHE", defaults.user_cache),
            sharing_cache: settings("SHARING_CACHE", defaults.sharing_cache),
            market_cache: settings("MARKET_CACHE", defaults.market_cache),
        }
    }

    /// Cache construction parameters for `domain`.
    pub fn cache_config(&self, domain: CacheDomain) -> CacheConfig {
        let settings = match domain {
            CacheDomain::Users => self.user_cache,
            CacheDomain::Sharing => self.sharing_cache,
            CacheDomain::Market => self.market_cache,
        };
        CacheConfig::default()
            .with_max_size(settings.max_size)
            .with_default_ttl(settings.ttl_ms)
            .with_cleanup_interval(self.cleanup_interval_ms)
    }
}

fn read_parsed<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
            limiter_cleanup_interval_ms: DEFAULT_LIMITER_CLEANUP_INTERVAL_MS,
            user_cache: CacheSettings {
                max_size: 200,
                ttl_ms: 10 * 60 * 1000,
            },
            sharing_cache: CacheSettings {
                max_size: 100,
                ttl_ms: 5 * 60 * 1000,
            },
            market_cache: CacheSettings {
                max_size: 50,
                ttl_ms: 2 * 60 * 1000,
            },
        }
    }
}
