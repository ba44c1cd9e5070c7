//! Resilient feed client.
//!
//! Every request runs through the same state machine:
//!
//! ```text
//! Attempting ──ok──────────────────────────────▶ Success
//!     │
//!     ├─ EscalateProxy + next tier exists ──────▶ Attempting (next tier, same retry budget)
//!     ├─ retryable + budget left ── backoff ───▶ Attempting (same tier)
//!     └─ otherwise ─────────────────────────────▶ Exhausted
//! ```
//!
//! [`FeedClient::fetch_with_fallback`] wraps one more pass on the dedicated
//! redirect proxy around that loop, and [`FeedClient::fetch_cached`] puts the
//! response cache in front of everything.

use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::Value;

use super::{RateLimiter, ResponseCache, RetryPolicy};
use crate::errors::{FeedError, RetryClass};
use crate::transport::HttpTransport;
use crate::upstream::{FeedRequest, ProxyTier};

/// HTTP client with rate limiting, retries, proxy fallback and caching.
///
/// The rate limiter and cache are injected so several clients (or tests)
/// can share or isolate them.
#[derive(Clone)]
pub struct FeedClient {
    transport: Arc<dyn HttpTransport>,
    rate_limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
    retry_policy: RetryPolicy,
}

impl FeedClient {
    /// Create a client with a fresh rate limiter, cache and default retry policy.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            rate_limiter: Arc::new(RateLimiter::new()),
            cache: Arc::new(ResponseCache::new()),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Create a client with injected state.
    pub fn with_config(
        transport: Arc<dyn HttpTransport>,
        rate_limiter: Arc<RateLimiter>,
        cache: Arc<ResponseCache>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            rate_limiter,
            cache,
            retry_policy,
        }
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Fetch through the response cache.
    ///
    /// A fresh cached response is returned without touching the network.
    pub async fn fetch_cached(&self, request: &FeedRequest) -> Result<Value, FeedError> {
        let key = request.cache_key();
        self.cache
            .get_or_fetch(&key, || self.fetch_with_fallback(request))
            .await
    }

    /// Fetch, then make one more full pass on the redirect proxy if that fails.
    pub async fn fetch_with_fallback(&self, request: &FeedRequest) -> Result<Value, FeedError> {
        let (primary_error, last_tier) = match self.run(request, ProxyTier::Direct).await {
            Ok(data) => return Ok(data),
            Err(failure) => failure,
        };

        let fallback = match request.upstream.fallback_tier() {
            Some(tier) if tier != last_tier => tier,
            _ => return Err(primary_error),
        };

        warn!(
            "Primary route failed for {}, trying {} proxy",
            request.endpoint(),
            fallback
        );

        match self.run(request, fallback).await {
            Ok(data) => Ok(data),
            Err((fallback_error, _)) => {
                error!(
                    "Both primary and fallback proxies failed for {}",
                    request.endpoint()
                );
                Err(fallback_error)
            }
        }
    }

    /// Run the retry loop once, starting on the direct tier.
    pub async fn fetch_with_retry(&self, request: &FeedRequest) -> Result<Value, FeedError> {
        self.run(request, ProxyTier::Direct)
            .await
            .map_err(|(error, _)| error)
    }

    /// Retry loop starting at `start`.
    ///
    /// On failure, returns the error together with the tier the last attempt used.
    async fn run(
        &self,
        request: &FeedRequest,
        start: ProxyTier,
    ) -> Result<Value, (FeedError, ProxyTier)> {
        let upstream = &request.upstream;
        let mut tier = start;
        let mut retry_count: u32 = 0;
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            debug!(
                "Attempting to fetch {} via {} (retry {}, attempt {})",
                request.endpoint(),
                tier,
                retry_count,
                attempts
            );

            if let Some(limit) = &upstream.rate_limit {
                self.rate_limiter.acquire_for(&upstream.id, limit).await;
            }

            let result = match request.http_request(tier) {
                Ok(http) => self.transport.get_json(&http).await,
                Err(e) => Err(e),
            };

            let err = match result {
                Ok(data) => {
                    info!("Successfully fetched {} via {}", request.endpoint(), tier);
                    return Ok(data);
                }
                Err(e) => e,
            };

            error!("Error fetching {} via {}: {}", request.endpoint(), tier, err);

            match err.retry_class() {
                RetryClass::Never => return Err((err, tier)),
                RetryClass::EscalateProxy => {
                    if let Some(next) = upstream.next_tier(tier) {
                        warn!(
                            "{} for {}, switching to {} proxy",
                            err.code(),
                            request.endpoint(),
                            next
                        );
                        tier = next;
                        continue;
                    }
                }
                RetryClass::WithBackoff => {}
            }

            if retry_count >= self.retry_policy.max_retries {
                return Err((
                    FeedError::Exhausted {
                        upstream: upstream.id.clone(),
                        attempts,
                        source: Box::new(err),
                    },
                    tier,
                ));
            }

            let delay = self.retry_policy.delay_for(retry_count);
            retry_count += 1;
            warn!(
                "Retrying {} (attempt {}/{}) in {:?}",
                request.endpoint(),
                retry_count,
                self.retry_policy.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RateLimitConfig;
    use crate::transport::HttpRequest;
    use crate::upstream::Upstream;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// What the mock answers for one attempt.
    #[derive(Clone)]
    enum Reply {
        Data(Value),
        Network,
        Timeout,
        RateLimited,
        Status(u16),
    }

    impl Reply {
        fn into_result(self, upstream: &str) -> Result<Value, FeedError> {
            let upstream = upstream.to_string();
            match self {
                Reply::Data(v) => Ok(v),
                Reply::Network => Err(FeedError::Network {
                    upstream,
                    message: "Network Error".to_string(),
                }),
                Reply::Timeout => Err(FeedError::Timeout { upstream }),
                Reply::RateLimited => Err(FeedError::RateLimited { upstream }),
                Reply::Status(status) => Err(FeedError::HttpStatus {
                    upstream,
                    status,
                    body: None,
                }),
            }
        }
    }

    /// Transport answering from a script, then repeating a default reply.
    struct ScriptedTransport {
        script: Mutex<VecDeque<Reply>>,
        default: Reply,
        calls: Mutex<Vec<ProxyTier>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Reply>, default: Reply) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                default,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn always(reply: Reply) -> Arc<Self> {
            Self::new(Vec::new(), reply)
        }

        fn tiers(&self) -> Vec<ProxyTier> {
            self.calls.lock().unwrap().clone()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn get_json(&self, request: &HttpRequest) -> Result<Value, FeedError> {
            self.calls.lock().unwrap().push(request.tier);
            let reply = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.default.clone());
            reply.into_result(&request.upstream)
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    fn client(transport: Arc<ScriptedTransport>) -> FeedClient {
        FeedClient::with_config(
            transport,
            Arc::new(RateLimiter::new()),
            Arc::new(ResponseCache::new()),
            fast_policy(),
        )
    }

    fn proxied_upstream() -> Arc<Upstream> {
        Arc::new(
            Upstream::statcan("https://statcan.test/rest/getData")
                .with_relay_proxy("https://relay.test/raw?url=")
                .with_redirect_proxy("https://redirect.test/?destination="),
        )
    }

    fn direct_upstream() -> Arc<Upstream> {
        Arc::new(Upstream::statcan("https://statcan.test/rest/getData"))
    }

    fn request(upstream: Arc<Upstream>) -> FeedRequest {
        FeedRequest::new(upstream, "1310049401-eng")
            .param("format", "json")
            .param("lang", "en")
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let transport = ScriptedTransport::always(Reply::Data(json!({"ok": true})));
        let client = client(transport.clone());

        let data = client.fetch_with_retry(&request(proxied_upstream())).await.unwrap();

        assert_eq!(data, json!({"ok": true}));
        assert_eq!(transport.tiers(), vec![ProxyTier::Direct]);
    }

    #[tokio::test]
    async fn test_generic_failure_attempted_one_plus_max_retries() {
        let transport = ScriptedTransport::always(Reply::Status(500));
        let client = client(transport.clone());

        let err = client
            .fetch_with_retry(&request(proxied_upstream()))
            .await
            .unwrap_err();

        assert_eq!(transport.call_count(), 4);
        assert!(transport.tiers().iter().all(|t| *t == ProxyTier::Direct));
        match err {
            FeedError::Exhausted {
                attempts, source, ..
            } => {
                assert_eq!(attempts, 4);
                assert_eq!(source.code(), "HTTP_STATUS");
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transient_failure_then_success() {
        let transport = ScriptedTransport::new(
            vec![Reply::Status(503), Reply::Status(502)],
            Reply::Data(json!([1, 2, 3])),
        );
        let client = client(transport.clone());

        let data = client.fetch_with_retry(&request(direct_upstream())).await.unwrap();

        assert_eq!(data, json!([1, 2, 3]));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn test_network_error_escalates_without_consuming_retry() {
        let transport = ScriptedTransport::new(
            vec![Reply::Network, Reply::Timeout],
            Reply::Data(json!("via redirect")),
        );
        let client = client(transport.clone());

        let data = client.fetch_with_retry(&request(proxied_upstream())).await.unwrap();

        assert_eq!(data, json!("via redirect"));
        assert_eq!(
            transport.tiers(),
            vec![ProxyTier::Direct, ProxyTier::CorsRelay, ProxyTier::Redirect]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_response_escalates_proxy() {
        let transport =
            ScriptedTransport::new(vec![Reply::RateLimited], Reply::Data(json!({"relay": true})));
        let client = client(transport.clone());

        client.fetch_with_retry(&request(proxied_upstream())).await.unwrap();

        assert_eq!(
            transport.tiers(),
            vec![ProxyTier::Direct, ProxyTier::CorsRelay]
        );
    }

    #[tokio::test]
    async fn test_escalation_on_last_tier_consumes_retries() {
        let transport = ScriptedTransport::always(Reply::Network);
        let client = client(transport.clone());

        let err = client
            .fetch_with_retry(&request(proxied_upstream()))
            .await
            .unwrap_err();

        // direct + relay escalate for free, then 1 + 3 attempts on the redirect tier
        assert_eq!(transport.call_count(), 6);
        let tiers = transport.tiers();
        assert_eq!(&tiers[..2], &[ProxyTier::Direct, ProxyTier::CorsRelay]);
        assert!(tiers[2..].iter().all(|t| *t == ProxyTier::Redirect));
        assert_eq!(err.root_cause().code(), "NETWORK");
    }

    #[tokio::test]
    async fn test_direct_only_upstream_retries_network_errors() {
        let transport = ScriptedTransport::always(Reply::Network);
        let client = client(transport.clone());

        let err = client
            .fetch_with_fallback(&request(direct_upstream()))
            .await
            .unwrap_err();

        assert_eq!(transport.call_count(), 4);
        assert_eq!(err.code(), "FETCH_EXHAUSTED");
    }

    #[tokio::test]
    async fn test_fallback_pass_runs_on_redirect_proxy() {
        // Four 500s exhaust the direct tier, then the redirect pass succeeds.
        let transport = ScriptedTransport::new(
            vec![
                Reply::Status(500),
                Reply::Status(500),
                Reply::Status(500),
                Reply::Status(500),
            ],
            Reply::Data(json!({"fallback": true})),
        );
        let client = client(transport.clone());

        let data = client
            .fetch_with_fallback(&request(proxied_upstream()))
            .await
            .unwrap();

        assert_eq!(data, json!({"fallback": true}));
        let tiers = transport.tiers();
        assert_eq!(tiers.len(), 5);
        assert_eq!(tiers[4], ProxyTier::Redirect);
    }

    #[tokio::test]
    async fn test_fallback_skipped_when_already_on_redirect() {
        let transport = ScriptedTransport::always(Reply::Network);
        let client = client(transport.clone());

        client
            .fetch_with_fallback(&request(proxied_upstream()))
            .await
            .unwrap_err();

        // Same count as a single retry loop: the loop already ended on the redirect tier
        assert_eq!(transport.call_count(), 6);
    }

    #[tokio::test]
    async fn test_fetch_cached_hits_network_once() {
        let transport = ScriptedTransport::always(Reply::Data(json!({"n": 1})));
        let client = client(transport.clone());
        let req = request(proxied_upstream());

        client.fetch_cached(&req).await.unwrap();
        let cached = client.fetch_cached(&req).await.unwrap();

        assert_eq!(cached, json!({"n": 1}));
        assert_eq!(transport.call_count(), 1);
        assert!(client.cache().is_fresh(&req.cache_key()));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let transport = ScriptedTransport::new(
            vec![
                Reply::Status(500),
                Reply::Status(500),
                Reply::Status(500),
                Reply::Status(500),
            ],
            Reply::Data(json!("later")),
        );
        let client = client(transport.clone());
        let req = request(direct_upstream());

        assert!(client.fetch_cached(&req).await.is_err());
        assert!(client.cache().is_empty());

        let data = client.fetch_cached(&req).await.unwrap();
        assert_eq!(data, json!("later"));
    }

    #[tokio::test]
    async fn test_every_attempt_counts_against_rate_limit() {
        let transport = ScriptedTransport::new(vec![Reply::Status(500)], Reply::Data(json!(1)));
        let client = client(transport.clone());
        let upstream = Arc::new(
            Upstream::who_gho("https://who.test/api").with_rate_limit(Some(RateLimitConfig {
                max_requests: 10,
                window: Duration::from_secs(60),
            })),
        );

        client
            .fetch_with_retry(&FeedRequest::new(upstream.clone(), "Indicator"))
            .await
            .unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(client.rate_limiter().remaining(&upstream.id), 8);
    }

    #[tokio::test]
    async fn test_invalid_request_fails_immediately() {
        let transport = ScriptedTransport::always(Reply::Data(json!(1)));
        let client = client(transport.clone());
        let upstream = Arc::new(Upstream::statcan("not a url"));

        let err = client
            .fetch_with_retry(&FeedRequest::new(upstream, "x"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "INVALID_REQUEST");
        assert_eq!(transport.call_count(), 0);
    }
}
