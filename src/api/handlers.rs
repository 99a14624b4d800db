//! API Handlers
//!
//! HTTP request handlers for the cache and rate-limiter inspection endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{
    validate_key, AttemptResponse, CacheEntryResponse, CacheKeysResponse, CacheStatsBody,
    DeleteResponse, HealthResponse, LimitInfoResponse, LimiterStatsBody, SetRequest, SetResponse,
    StatsResponse,
};
use crate::registry::Registry;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Wraps an already shared registry.
    pub fn from_shared(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

fn checked_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(msg) => Err(Error::InvalidRequest(msg)),
        None => Ok(()),
    }
}

/// Handler for PUT /caches/:cache/:key
pub async fn set_entry_handler(
    State(state): State<AppState>,
    Path((cache_name, key)): Path<(String, String)>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    checked_key(&key)?;
    let cache = state.registry.cache_by_name(&cache_name)?;

    cache.set(key.clone(), req.value, req.ttl_ms).await;

    Ok(Json(SetResponse::new(cache_name, key)))
}

/// Handler for GET /caches/:cache/:key
///
/// Expired entries are dropped by the lookup and reported as not found.
pub async fn get_entry_handler(
    State(state): State<AppState>,
    Path((cache_name, key)): Path<(String, String)>,
) -> Result<Json<CacheEntryResponse>> {
    let cache = state.registry.cache_by_name(&cache_name)?;

    let (value, info) = cache
        .get_with_info(&key)
        .await
        .ok_or_else(|| Error::NotFound(key.clone()))?;

    Ok(Json(CacheEntryResponse::new(cache_name, key, value, info)))
}

/// Handler for DELETE /caches/:cache/:key
pub async fn delete_entry_handler(
    State(state): State<AppState>,
    Path((cache_name, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let cache = state.registry.cache_by_name(&cache_name)?;

    if !cache.delete(&key).await {
        return Err(Error::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(format!(
        "Key '{}' deleted from '{}'",
        key, cache_name
    ))))
}

/// Handler for GET /caches/:cache
pub async fn list_keys_handler(
    State(state): State<AppState>,
    Path(cache_name): Path<String>,
) -> Result<Json<CacheKeysResponse>> {
    let keys = state.registry.cache_by_name(&cache_name)?.keys().await;

    Ok(Json(CacheKeysResponse {
        cache: cache_name,
        keys,
    }))
}

/// Handler for DELETE /caches/:cache
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    Path(cache_name): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.registry.cache_by_name(&cache_name)?.clear().await;
    debug!(cache = %cache_name, "cache cleared over API");

    Ok(Json(DeleteResponse::new(format!(
        "Cache '{}' cleared",
        cache_name
    ))))
}

/// Handler for POST /limits/:action/:key
///
/// Records one attempt. A throttled attempt maps to 429.
pub async fn attempt_handler(
    State(state): State<AppState>,
    Path((action, key)): Path<(String, String)>,
) -> Result<Json<AttemptResponse>> {
    checked_key(&key)?;
    let limiter = state.registry.limiter_by_name(&action)?;

    let info = limiter.check(&key).await?;

    Ok(Json(AttemptResponse::allowed(action, key, info)))
}

/// Handler for GET /limits/:action/:key
pub async fn limit_info_handler(
    State(state): State<AppState>,
    Path((action, key)): Path<(String, String)>,
) -> Result<Json<LimitInfoResponse>> {
    let info = state
        .registry
        .limiter_by_name(&action)?
        .get_limit_info(&key)
        .await
        .ok_or_else(|| Error::NotFound(key.clone()))?;

    Ok(Json(LimitInfoResponse { action, key, info }))
}

/// Handler for DELETE /limits/:action/:key
pub async fn reset_limit_handler(
    State(state): State<AppState>,
    Path((action, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    state.registry.limiter_by_name(&action)?.reset(&key).await;

    Ok(Json(DeleteResponse::new(format!(
        "Limit for '{}' reset on '{}'",
        key, action
    ))))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let mut response = StatsResponse::default();

    for (domain, cache) in state.registry.caches() {
        let stats = cache.stats().await;
        response
            .caches
            .insert(domain.to_string(), CacheStatsBody::from(stats));
    }

    for (action, limiter) in state.registry.limiters() {
        let config = limiter.config().await;
        response.limiters.insert(
            action.to_string(),
            LimiterStatsBody {
                max_attempts: config.max_attempts(),
                window_ms: config.window_ms(),
                tracked_keys: limiter.len().await,
            },
        );
    }

    Json(response)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use serde_json::json;

    fn test_state() -> (AppState, ManualClock) {
        let clock = ManualClock::new(0);
        let registry = Registry::with_clock(&Config::default(), Arc::new(clock.clone())).unwrap();
        (AppState::new(registry), clock)
    }

    fn path(a: &str, b: &str) -> Path<(String, String)> {
        Path((a.to_string(), b.to_string()))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let (state, clock) = test_state();

        let req = SetRequest {
            value: json!({"name": "alice"}),
            ttl_ms: None,
        };
        let set = set_entry_handler(State(state.clone()), path("users", "u1"), Json(req))
            .await
            .unwrap();
        assert_eq!(set.key, "u1");

        clock.advance(30);
        let response = get_entry_handler(State(state), path("users", "u1"))
            .await
            .unwrap();
        assert_eq!(response.value["name"], "alice");
        assert_eq!(response.age_ms, 30);
        assert_eq!(response.ttl_ms, 10 * 60 * 1000);
    }

    #[tokio::test]
    async fn test_get_expired_entry() {
        let (state, clock) = test_state();

        let req = SetRequest {
            value: json!(1),
            ttl_ms: Some(100),
        };
        let _response = set_entry_handler(State(state.clone()), path("market", "eth"), Json(req))
            .await
            .unwrap();
        clock.advance(101);

        let result = get_entry_handler(State(state), path("market", "eth")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_cache() {
        let (state, _) = test_state();

        let result = get_entry_handler(State(state), path("ledger", "k")).await;
        assert!(matches!(result, Err(Error::UnknownCache(_))));
    }

    #[tokio::test]
    async fn test_set_invalid_key() {
        let (state, _) = test_state();

        let req = SetRequest {
            value: json!(null),
            ttl_ms: None,
        };
        let long_key = "x".repeat(300);
        let result = set_entry_handler(State(state), path("users", &long_key), Json(req)).await;
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let (state, _) = test_state();
        let sharing = state.registry.cache_by_name("sharing").unwrap();
        sharing.set("a", json!(1), None).await;
        sharing.set("b", json!(2), None).await;

        let deleted = delete_entry_handler(State(state.clone()), path("sharing", "a"))
            .await
            .unwrap();
        assert!(deleted.message.contains("'a'"));
        let again = delete_entry_handler(State(state.clone()), path("sharing", "a")).await;
        assert!(matches!(again, Err(Error::NotFound(_))));

        let keys = list_keys_handler(State(state.clone()), Path("sharing".to_string()))
            .await
            .unwrap();
        assert_eq!(keys.keys, vec!["b".to_string()]);

        let _response = clear_cache_handler(State(state.clone()), Path("sharing".to_string()))
            .await
            .unwrap();
        assert_eq!(sharing.size().await, 0);
    }

    #[tokio::test]
    async fn test_attempt_until_throttled() {
        let (state, _) = test_state();

        for expected_remaining in (0..5).rev() {
            let response = attempt_handler(State(state.clone()), path("login", "alice"))
                .await
                .unwrap();
            assert_eq!(response.remaining, expected_remaining);
        }

        let throttled = attempt_handler(State(state.clone()), path("login", "alice")).await;
        assert!(throttled.unwrap_err().is_rate_limited());

        let info = limit_info_handler(State(state.clone()), path("login", "alice"))
            .await
            .unwrap();
        assert_eq!(info.info.attempts, 5);

        let _response = reset_limit_handler(State(state.clone()), path("login", "alice"))
            .await
            .unwrap();
        assert!(attempt_handler(State(state), path("login", "alice")).await.is_ok());
    }

    #[tokio::test]
    async fn test_attempt_reports_the_window_it_counted() {
        let (state, clock) = test_state();
        clock.set(2_000);

        let response = attempt_handler(State(state.clone()), path("file_upload", "bob"))
            .await
            .unwrap();
        assert_eq!(response.attempts, 1);
        assert_eq!(response.remaining, 9);
        assert_eq!(response.reset_time, 2_000 + 60 * 60 * 1000);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let (state, _) = test_state();
        let attempt = attempt_handler(State(state.clone()), path("user_search", "q"))
            .await
            .unwrap();
        assert_eq!(attempt.attempts, 1);

        let response = stats_handler(State(state)).await;
        assert_eq!(response.caches.len(), 3);
        assert_eq!(response.caches["users"].hits, 0);
        assert_eq!(response.limiters["user_search"].tracked_keys, 1);
        assert_eq!(response.limiters["login"].max_attempts, 5);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
