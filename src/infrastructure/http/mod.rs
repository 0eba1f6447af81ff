//! Outbound HTTP plumbing: credentials, rate limiting, response caching and
//! the client that composes them.

pub mod auth;
pub mod cache;
pub mod client;
pub mod errors;
pub mod rate_limiter;

pub use auth::AuthStrategy;
pub use cache::{cache_key, ClearResult, ResponseCache};
pub use client::{ApiClient, ApiClientConfig};
pub use errors::ApiClientError;
pub use rate_limiter::{RateLimitDecision, RateLimitStatus, RateLimiter};
