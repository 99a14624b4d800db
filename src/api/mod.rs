//! API Module
//!
//! HTTP handlers and routing for inspecting and driving the registry.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache and limiter statistics
//! - `GET /caches/:cache` - List keys of a cache
//! - `DELETE /caches/:cache` - Clear a cache
//! - `PUT /caches/:cache/:key` - Store a value
//! - `GET /caches/:cache/:key` - Retrieve a value with its age and TTL
//! - `DELETE /caches/:cache/:key` - Delete a value
//! - `POST /limits/:action/:key` - Record an attempt (429 when throttled)
//! - `GET /limits/:action/:key` - Current window state
//! - `DELETE /limits/:action/:key` - Reset a key's window

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
