//! Request and Response models for the inspection API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{validate_key, SetRequest, MAX_KEY_LENGTH};
pub use responses::{
    AttemptResponse, CacheEntryResponse, CacheKeysResponse, CacheStatsBody, DeleteResponse,
    ErrorResponse, HealthResponse, LimitInfoResponse, LimiterStatsBody, SetResponse,
    StatsResponse,
};
