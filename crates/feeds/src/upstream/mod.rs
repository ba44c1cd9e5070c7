//! Upstream descriptors, proxy tiers and request construction.
//!
//! An [`Upstream`] describes one statistical data provider: where it lives,
//! which relay proxies can reach it, how long an attempt may take and
//! whether it is rate limited. A [`FeedRequest`] targets a path on an
//! upstream and knows how to render itself for each [`ProxyTier`].

pub mod headers;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

use crate::client::RateLimitConfig;
use crate::errors::FeedError;
use crate::transport::HttpRequest;

pub use headers::{safe_headers, STATCAN_ACCEPT_LANGUAGE, WHO_ACCEPT_LANGUAGE};

/// Statistics Canada identifier used in logs and rate limiting.
pub const STATCAN_ID: &str = "STATCAN";

/// WHO Global Health Observatory identifier.
pub const WHO_GHO_ID: &str = "WHO_GHO";

/// Timeout for most upstreams.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// WHO GHO responses are large and slow.
pub const WHO_TIMEOUT: Duration = Duration::from_secs(30);

/// The route a request takes to its upstream.
///
/// Tiers are tried in declaration order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ProxyTier {
    /// Call the upstream directly.
    Direct,
    /// Go through a CORS relay that takes the target as a query parameter.
    CorsRelay,
    /// Go through the dedicated fallback redirect proxy.
    Redirect,
}

impl fmt::Display for ProxyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::CorsRelay => write!(f, "cors-relay"),
            Self::Redirect => write!(f, "redirect"),
        }
    }
}

/// A statistical data provider reachable over HTTP.
#[derive(Clone, Debug)]
pub struct Upstream {
    /// Stable identifier (e.g. "STATCAN", "WHO_GHO").
    pub id: String,
    /// Base URL requests are built on.
    pub base_url: String,
    /// Prefix of the CORS relay; the encoded target URL is appended.
    pub relay_proxy: Option<String>,
    /// Prefix of the fallback redirect proxy; the encoded target URL is appended.
    pub redirect_proxy: Option<String>,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Accept-Language variant for this upstream.
    pub accept_language: &'static str,
    /// Request window, when the upstream enforces one.
    pub rate_limit: Option<RateLimitConfig>,
}

impl Upstream {
    /// Create an upstream reachable only directly.
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            relay_proxy: None,
            redirect_proxy: None,
            timeout: DEFAULT_TIMEOUT,
            accept_language: headers::DEFAULT_ACCEPT_LANGUAGE,
            rate_limit: None,
        }
    }

    /// Statistics Canada web data service.
    pub fn statcan(base_url: impl Into<String>) -> Self {
        Self {
            accept_language: STATCAN_ACCEPT_LANGUAGE,
            ..Self::new(STATCAN_ID, base_url)
        }
    }

    /// WHO GHO OData API. Rate limited with the default window.
    pub fn who_gho(base_url: impl Into<String>) -> Self {
        Self {
            timeout: WHO_TIMEOUT,
            accept_language: WHO_ACCEPT_LANGUAGE,
            rate_limit: Some(RateLimitConfig::default()),
            ..Self::new(WHO_GHO_ID, base_url)
        }
    }

    pub fn with_relay_proxy(mut self, prefix: impl Into<String>) -> Self {
        self.relay_proxy = Some(prefix.into());
        self
    }

    pub fn with_redirect_proxy(mut self, prefix: impl Into<String>) -> Self {
        self.redirect_proxy = Some(prefix.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: Option<RateLimitConfig>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Whether the given tier is configured for this upstream.
    pub fn supports(&self, tier: ProxyTier) -> bool {
        match tier {
            ProxyTier::Direct => true,
            ProxyTier::CorsRelay => self.relay_proxy.is_some(),
            ProxyTier::Redirect => self.redirect_proxy.is_some(),
        }
    }

    /// The configured tier that follows `current`, skipping unconfigured ones.
    pub fn next_tier(&self, current: ProxyTier) -> Option<ProxyTier> {
        [ProxyTier::CorsRelay, ProxyTier::Redirect]
            .into_iter()
            .find(|tier| *tier > current && self.supports(*tier))
    }

    /// The tier used by the outer fallback pass, if any.
    pub fn fallback_tier(&self) -> Option<ProxyTier> {
        self.supports(ProxyTier::Redirect)
            .then_some(ProxyTier::Redirect)
    }
}

/// A GET against a path on an upstream.
#[derive(Clone, Debug)]
pub struct FeedRequest {
    pub upstream: Arc<Upstream>,
    pub path: String,
    /// Query parameters. Ordered so the cache key is deterministic.
    pub params: BTreeMap<String, String>,
}

impl FeedRequest {
    pub fn new(upstream: Arc<Upstream>, path: impl Into<String>) -> Self {
        Self {
            upstream,
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Target URL without query parameters.
    pub fn endpoint(&self) -> String {
        let base = self.upstream.base_url.trim_end_matches('/');
        let path = self.path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Cache key: endpoint plus serialized parameters.
    pub fn cache_key(&self) -> String {
        let params = serde_json::to_string(&self.params).unwrap_or_default();
        format!("{}-{}", self.endpoint(), params)
    }

    /// Direct URL including query parameters.
    pub fn target_url(&self) -> Result<Url, FeedError> {
        Url::parse_with_params(&self.endpoint(), &self.params).map_err(|e| {
            FeedError::InvalidRequest {
                upstream: self.upstream.id.clone(),
                message: format!("Failed to build URL: {}", e),
            }
        })
    }

    /// URL to call for the given tier.
    pub fn url_for(&self, tier: ProxyTier) -> Result<Url, FeedError> {
        let target = self.target_url()?;
        let prefix = match tier {
            ProxyTier::Direct => return Ok(target),
            ProxyTier::CorsRelay => self.upstream.relay_proxy.as_deref(),
            ProxyTier::Redirect => self.upstream.redirect_proxy.as_deref(),
        };
        let prefix = prefix.ok_or_else(|| FeedError::InvalidRequest {
            upstream: self.upstream.id.clone(),
            message: format!("No {} proxy configured", tier),
        })?;

        let proxied = format!("{}{}", prefix, urlencoding::encode(target.as_str()));
        Url::parse(&proxied).map_err(|e| FeedError::InvalidRequest {
            upstream: self.upstream.id.clone(),
            message: format!("Failed to build {} URL: {}", tier, e),
        })
    }

    /// Build the transport request for the given tier.
    pub fn http_request(&self, tier: ProxyTier) -> Result<HttpRequest, FeedError> {
        Ok(HttpRequest {
            upstream: self.upstream.id.clone(),
            tier,
            url: self.url_for(tier)?,
            headers: safe_headers(self.upstream.accept_language),
            timeout: self.upstream.timeout,
        })
    }
}
