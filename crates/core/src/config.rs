//! Environment-driven configuration.
//!
//! Values come from `MINDSCOPE_*` variables (a `.env` file is honored).
//! Invalid values are logged and replaced by their defaults.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use log::warn;

use mindscope_feeds::{
    FeedClient, HttpTransport, RateLimitConfig, RateLimiter, ReqwestTransport, ResponseCache,
    RetryPolicy, Upstream,
};

use crate::logging::{LogFormat, LoggingConfig};
use crate::mental_health::MentalHealthService;

pub const DEFAULT_STATCAN_BASE_URL: &str = "https://api.statcan.gc.ca/rest/getData";
pub const DEFAULT_WHO_BASE_URL: &str = "https://ghoapi.azureedge.net/api";
pub const DEFAULT_RELAY_PROXY: &str = "https://api.allorigins.win/raw?url=";
pub const DEFAULT_REDIRECT_PROXY: &str =
    "https://thriving-semolina-cfa630.netlify.app/?destination=";

const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1000;
const DEFAULT_WHO_RATE_LIMIT: u32 = 50;
const DEFAULT_WHO_RATE_WINDOW_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub statcan_base_url: String,
    pub who_base_url: String,
    /// CORS relay prefix; `None` disables the tier.
    pub relay_proxy: Option<String>,
    /// Redirect proxy prefix; `None` disables the tier and the fallback pass.
    pub redirect_proxy: Option<String>,
    pub cache_ttl: Duration,
    pub retry_policy: RetryPolicy,
    pub who_rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {} value '{}', using default", key, raw);
            default
        }),
        None => default,
    }
}

/// A numeric setting that must be non-zero.
fn positive_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Default + PartialEq + Copy,
{
    let value = parse_or(lookup, key, default);
    if value == T::default() {
        warn!("{} must be positive, using default", key);
        default
    } else {
        value
    }
}

/// A URL-ish setting. Empty disables it.
fn optional_string(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Option<String> {
    let value = lookup(key).unwrap_or_else(|| default.to_string());
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn string_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    optional_string(lookup, key, default).unwrap_or_else(|| {
        warn!("{} is empty, using default", key);
        default.to_string()
    })
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            statcan_base_url: string_or(
                &lookup,
                "MINDSCOPE_STATCAN_BASE_URL",
                DEFAULT_STATCAN_BASE_URL,
            ),
            who_base_url: string_or(&lookup, "MINDSCOPE_WHO_BASE_URL", DEFAULT_WHO_BASE_URL),
            relay_proxy: optional_string(&lookup, "MINDSCOPE_RELAY_PROXY", DEFAULT_RELAY_PROXY),
            redirect_proxy: optional_string(
                &lookup,
                "MINDSCOPE_REDIRECT_PROXY",
                DEFAULT_REDIRECT_PROXY,
            ),
            cache_ttl: Duration::from_secs(parse_or(
                &lookup,
                "MINDSCOPE_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )),
            retry_policy: RetryPolicy {
                max_retries: parse_or(&lookup, "MINDSCOPE_MAX_RETRIES", DEFAULT_MAX_RETRIES),
                base_delay: Duration::from_millis(parse_or(
                    &lookup,
                    "MINDSCOPE_RETRY_BASE_DELAY_MS",
                    DEFAULT_RETRY_BASE_DELAY_MS,
                )),
            },
            who_rate_limit: RateLimitConfig {
                max_requests: positive_or(
                    &lookup,
                    "MINDSCOPE_WHO_RATE_LIMIT",
                    DEFAULT_WHO_RATE_LIMIT,
                ),
                window: Duration::from_secs(positive_or(
                    &lookup,
                    "MINDSCOPE_WHO_RATE_WINDOW_SECS",
                    DEFAULT_WHO_RATE_WINDOW_SECS,
                )),
            },
            logging: LoggingConfig {
                level: string_or(&lookup, "MINDSCOPE_LOG_LEVEL", "info"),
                format: lookup("MINDSCOPE_LOG_FORMAT")
                    .map(|f| LogFormat::parse(&f))
                    .unwrap_or_default(),
            },
        }
    }

    fn with_proxies(&self, upstream: Upstream) -> Upstream {
        let upstream = match &self.relay_proxy {
            Some(prefix) => upstream.with_relay_proxy(prefix.clone()),
            None => upstream,
        };
        match &self.redirect_proxy {
            Some(prefix) => upstream.with_redirect_proxy(prefix.clone()),
            None => upstream,
        }
    }

    pub fn statcan_upstream(&self) -> Upstream {
        self.with_proxies(Upstream::statcan(self.statcan_base_url.clone()))
    }

    pub fn who_upstream(&self) -> Upstream {
        self.with_proxies(Upstream::who_gho(self.who_base_url.clone()))
            .with_rate_limit(Some(self.who_rate_limit.clone()))
    }

    /// Wire a service over the given transport.
    pub fn build_service_with_transport(
        &self,
        transport: Arc<dyn HttpTransport>,
    ) -> MentalHealthService {
        let client = FeedClient::with_config(
            transport,
            Arc::new(RateLimiter::new()),
            Arc::new(ResponseCache::with_ttl(self.cache_ttl)),
            self.retry_policy.clone(),
        );
        MentalHealthService::new(client, self.statcan_upstream(), self.who_upstream())
    }

    /// Wire a service that talks HTTP through `reqwest`.
    pub fn build_service(&self) -> MentalHealthService {
        self.build_service_with_transport(Arc::new(ReqwestTransport::new()))
    }
}
