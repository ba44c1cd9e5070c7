//! Mindscope Feeds Crate
//!
//! Resilient HTTP access to public statistical APIs (Statistics Canada,
//! WHO Global Health Observatory) for the Mindscope pipeline.
//!
//! # Overview
//!
//! The feeds crate supports:
//! - Per-upstream fixed-window rate limiting
//! - Retries with exponential backoff and jitter
//! - Escalation through CORS relay and redirect proxies
//! - A TTL cache for raw JSON responses
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |   FeedRequest    |  (upstream + path + params)
//! +------------------+
//!          |
//!          v
//! +------------------+     +------------------+
//! |  ResponseCache   | --> |   FeedClient     |  (retry / proxy state machine)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   RateLimiter    |  (per-upstream window)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |  HttpTransport   |  (reqwest, or a mock in tests)
//!                          +------------------+
//! ```
//!
//! Responses come back as raw [`serde_json::Value`]; interpreting their
//! shape is the caller's job.

pub mod client;
pub mod errors;
pub mod transport;
pub mod upstream;

pub use client::{FeedClient, RateLimitConfig, RateLimiter, ResponseCache, RetryPolicy};
pub use errors::{FeedError, RetryClass};
pub use transport::{HttpRequest, HttpTransport, ReqwestTransport};
pub use upstream::{FeedRequest, ProxyTier, Upstream, STATCAN_ID, WHO_GHO_ID};
