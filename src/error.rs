//! Error types for caches, rate limiters and the inspection API
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Error Enum ==
/// Unified error type for the crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A rate-limited action was attempted after its window budget ran out
    #[error("Rate limit exceeded for '{key}', try again in {retry_after_ms} ms")]
    RateLimitExceeded {
        /// Full (prefixed) limiter key
        key: String,
        /// Milliseconds until the current window ends
        retry_after_ms: u64,
    },

    /// Construction parameters were rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Key not present (or expired)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No cache registered under this name
    #[error("Unknown cache: {0}")]
    UnknownCache(String),

    /// No rate limiter registered under this action name
    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

impl Error {
    /// True for deliberate throttling, as opposed to a fault.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimitExceeded { .. })
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Error::InvalidConfig(_) | Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) | Error::UnknownCache(_) | Error::UnknownAction(_) => {
                StatusCode::NOT_FOUND
            }
        };

        let retry_after = match &self {
            Error::RateLimitExceeded { retry_after_ms, .. } => Some(retry_after_ms.div_ceil(1000)),
            _ => None,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;
