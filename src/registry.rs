//! Registry Module
//!
//! Application-wide cache and rate-limiter instances: one cache per data
//! domain and one limiter per preset action, plus the sweeps that keep them
//! tidy.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::cache::SharedCache;
use crate::clock::{system_clock, Clock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::limiter::{LimitAction, SharedRateLimiter};
use crate::tasks::{spawn_limiter_cleanup, CleanupHandle};

// == Cache Domain ==
/// Data domains that get their own cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheDomain {
    Users,
    Sharing,
    Market,
}

impl CacheDomain {
    pub const ALL: [CacheDomain; 3] = [CacheDomain::Users, CacheDomain::Sharing, CacheDomain::Market];

    pub fn name(&self) -> &'static str {
        match self {
            CacheDomain::Users => "users",
            CacheDomain::Sharing => "sharing",
            CacheDomain::Market => "market",
        }
    }
}

impl fmt::Display for CacheDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CacheDomain {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        CacheDomain::ALL
            .into_iter()
            .find(|domain| domain.name() == s)
            .ok_or_else(|| Error::UnknownCache(s.to_string()))
    }
}

// == Registry ==
/// Owns every process-wide cache and limiter.
#[derive(Debug)]
pub struct Registry {
    caches: BTreeMap<CacheDomain, SharedCache<Value>>,
    limiters: BTreeMap<LimitAction, SharedRateLimiter>,
    limiter_cleanup_interval_ms: u64,
    limiter_cleanup: Option<CleanupHandle>,
}

impl Registry {
    /// Builds all caches and limiters on the system clock.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_clock(config, system_clock())
    }

    /// Builds all caches and limiters on a shared clock.
    pub fn with_clock(config: &Config, clock: Arc<dyn Clock>) -> Result<Self> {
        if config.limiter_cleanup_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "limiter_cleanup_interval_ms must be greater than zero".to_string(),
            ));
        }

        let mut caches = BTreeMap::new();
        for domain in CacheDomain::ALL {
            let cache = SharedCache::with_clock(config.cache_config(domain), Arc::clone(&clock))?;
            caches.insert(domain, cache);
        }

        let limiters = LimitAction::ALL
            .into_iter()
            .map(|action| {
                let limiter = SharedRateLimiter::with_clock(action.config(), Arc::clone(&clock));
                (action, limiter)
            })
            .collect();

        Ok(Self {
            caches,
            limiters,
            limiter_cleanup_interval_ms: config.limiter_cleanup_interval_ms,
            limiter_cleanup: None,
        })
    }

    /// Starts a sweep per cache and one shared sweep over all limiters.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_cleanup(&mut self) {
        for cache in self.caches.values() {
            cache.start_cleanup();
        }
        if self.limiter_cleanup.is_none() {
            let limiters: Vec<SharedRateLimiter> = self.limiters.values().cloned().collect();
            self.limiter_cleanup = Some(spawn_limiter_cleanup(
                &limiters,
                self.limiter_cleanup_interval_ms,
            ));
        }
        info!(
            caches = self.caches.len(),
            limiters = self.limiters.len(),
            "registry cleanup tasks started"
        );
    }

    /// Stops every background sweep.
    pub fn shutdown(&self) {
        for cache in self.caches.values() {
            cache.dispose();
        }
        if let Some(cleanup) = &self.limiter_cleanup {
            cleanup.dispose();
        }
        info!("registry cleanup tasks stopped");
    }

    pub fn cache(&self, domain: CacheDomain) -> &SharedCache<Value> {
        // Every domain is inserted at construction
        &self.caches[&domain]
    }

    /// Looks up a cache by its domain name.
    pub fn cache_by_name(&self, name: &str) -> Result<&SharedCache<Value>> {
        let domain: CacheDomain = name.parse()?;
        Ok(self.cache(domain))
    }

    pub fn limiter(&self, action: LimitAction) -> &SharedRateLimiter {
        &self.limiters[&action]
    }

    /// Looks up a limiter by its action name.
    pub fn limiter_by_name(&self, name: &str) -> Result<&SharedRateLimiter> {
        let action: LimitAction = name.parse()?;
        Ok(self.limiter(action))
    }

    pub fn caches(&self) -> impl Iterator<Item = (CacheDomain, &SharedCache<Value>)> {
        self.caches.iter().map(|(domain, cache)| (*domain, cache))
    }

    pub fn limiters(&self) -> impl Iterator<Item = (LimitAction, &SharedRateLimiter)> {
        self.limiters.iter().map(|(action, limiter)| (*action, limiter))
    }
}
