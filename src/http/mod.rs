//! HTTP client module
//!
//! Thin `reqwest` wrapper used by the remote table client.
//!
//! # Features
//!
//! - **Optional Retries**: off by default, configurable with backoff
//! - **Rate Limiting**: token bucket rate limiter using governor
//! - **Error Classification**: status codes mapped onto the crate error type

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
