//! API Routes
//!
//! Configures the Axum router with all inspection endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    attempt_handler, clear_cache_handler, delete_entry_handler, get_entry_handler,
    health_handler, limit_info_handler, list_keys_handler, reset_limit_handler,
    set_entry_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /stats` - Per-cache and per-limiter statistics
/// - `GET|DELETE /caches/:cache` - List keys / clear a cache
/// - `GET|PUT|DELETE /caches/:cache/:key` - Read, write or remove an entry
/// - `GET|POST|DELETE /limits/:action/:key` - Inspect, attempt or reset a limit
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route(
            "/caches/:cache",
            get(list_keys_handler).delete(clear_cache_handler),
        )
        .route(
            "/caches/:cache/:key",
            get(get_entry_handler)
                .put(set_entry_handler)
                .delete(delete_entry_handler),
        )
        .route(
            "/limits/:action/:key",
            post(attempt_handler)
                .get(limit_info_handler)
                .delete(reset_limit_handler),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
