//! Feed client and the shared state it runs on.
//!
//! - [`RateLimiter`]: fixed request windows per upstream
//! - [`ResponseCache`]: TTL cache for raw responses
//! - [`RetryPolicy`]: retry budget and jittered backoff
//! - [`FeedClient`]: ties the three together around an [`HttpTransport`](crate::transport::HttpTransport)

mod cache;
mod feed_client;
mod rate_limiter;
mod retry_policy;

pub use cache::{ResponseCache, DEFAULT_TTL};
pub use feed_client::FeedClient;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use retry_policy::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, MAX_BACKOFF};
