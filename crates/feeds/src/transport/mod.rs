//! HTTP transport abstraction.
//!
//! The feed client never talks to `reqwest` directly; it goes through the
//! [`HttpTransport`] trait so retry, proxy and rate-limit behavior can be
//! exercised without a network.

mod http;

pub use http::ReqwestTransport;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Url;
use serde_json::Value;

use crate::errors::FeedError;
use crate::upstream::ProxyTier;

/// A single GET attempt, fully rendered for one proxy tier.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// Upstream identifier, carried into errors.
    pub upstream: String,
    /// Tier this request was rendered for.
    pub tier: ProxyTier,
    pub url: Url,
    pub headers: HeaderMap,
    pub timeout: Duration,
}

/// Performs one HTTP GET and decodes the body as JSON.
///
/// Implementations map every failure to a [`FeedError`] variant so the
/// client can classify it. They must not retry on their own.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_json(&self, request: &HttpRequest) -> Result<Value, FeedError>;
}
