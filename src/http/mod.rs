//! HTTP client module
//!
//! GET client behind the sync engine's [`crate::source::PageSource`].
//!
//! # Features
//!
//! - **Nothing to sync**: 404, 204 and empty or `null` bodies map to `None`
//! - **Retries**: 429 (honoring `Retry-After`), 5xx, timeouts, connect errors
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Authentication**: Integration with auth module

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, RetryPolicy, DEFAULT_USER_AGENT};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
