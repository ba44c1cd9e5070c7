//! `reqwest`-backed transport.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;

use super::{HttpRequest, HttpTransport};
use crate::errors::{is_cors_message, is_rate_limit_message, FeedError};

/// Longest response body excerpt kept in an error.
const MAX_ERROR_BODY: usize = 512;

/// Transport backed by a shared `reqwest::Client`.
///
/// Timeouts are applied per request from [`HttpRequest::timeout`], so one
/// client serves upstreams with different limits.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        let client = Client::builder()
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Use an existing client (shared connection pool, custom TLS, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, request: &HttpRequest) -> Result<Value, FeedError> {
        let upstream = request.upstream.as_str();
        debug!("GET {} via {} ({})", request.url, request.tier, upstream);

        let response = self
            .client
            .get(request.url.clone())
            .headers(request.headers.clone())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| FeedError::from_reqwest(upstream, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FeedError::RateLimited {
                upstream: upstream.to_string(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| FeedError::from_reqwest(upstream, e))?;

        if !status.is_success() {
            if is_rate_limit_message(&text) {
                return Err(FeedError::RateLimited {
                    upstream: upstream.to_string(),
                });
            }
            return Err(FeedError::HttpStatus {
                upstream: upstream.to_string(),
                status: status.as_u16(),
                body: (!text.is_empty()).then(|| excerpt(&text)),
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            // Relays answer 200 with a plain-text error page when they refuse a request.
            if is_cors_message(&text) {
                FeedError::Cors {
                    upstream: upstream.to_string(),
                    message: excerpt(&text),
                }
            } else {
                FeedError::InvalidBody {
                    upstream: upstream.to_string(),
                    message: format!("Failed to parse response: {}", e),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RetryClass;
    use crate::upstream::ProxyTier;
    use reqwest::header::HeaderMap;
    use reqwest::Url;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(
        status_line: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                content_type,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        Url::parse(&format!("http://{}/api/Indicator", addr)).unwrap()
    }

    fn request_to(url: Url) -> HttpRequest {
        HttpRequest {
            upstream: "WHO_GHO".to_string(),
            tier: ProxyTier::Direct,
            url,
            headers: HeaderMap::new(),
            timeout: Duration::from_secs(5),
        }
    }

    fn local_transport() -> ReqwestTransport {
        ReqwestTransport::with_client(Client::builder().no_proxy().build().unwrap())
    }

    #[tokio::test]
    async fn test_json_body_is_returned() {
        let url = serve_once("200 OK", "application/json", r#"{"value":[{"Value":0.14}]}"#).await;

        let body = local_transport().get_json(&request_to(url)).await.unwrap();
        assert_eq!(body["value"][0]["Value"], 0.14);
    }

    #[tokio::test]
    async fn test_429_is_rate_limited() {
        let url = serve_once("429 Too Many Requests", "text/plain", "slow down").await;

        let err = local_transport().get_json(&request_to(url)).await.unwrap_err();
        assert!(matches!(err, FeedError::RateLimited { .. }), "{:?}", err);
        assert_eq!(err.retry_class(), RetryClass::EscalateProxy);
    }

    #[tokio::test]
    async fn test_error_status_with_rate_limit_body_is_rate_limited() {
        let url = serve_once(
            "500 Internal Server Error",
            "text/plain",
            "Rate limit exceeded, try again later",
        )
        .await;

        let err = local_transport().get_json(&request_to(url)).await.unwrap_err();
        assert!(matches!(err, FeedError::RateLimited { .. }), "{:?}", err);
        assert_eq!(err.retry_class(), RetryClass::EscalateProxy);
    }

    #[tokio::test]
    async fn test_plain_error_status_keeps_status_and_body() {
        let url = serve_once("503 Service Unavailable", "text/plain", "maintenance").await;

        let err = local_transport().get_json(&request_to(url)).await.unwrap_err();
        match &err {
            FeedError::HttpStatus { status, body, .. } => {
                assert_eq!(*status, 503);
                assert_eq!(body.as_deref(), Some("maintenance"));
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
        assert_eq!(err.retry_class(), RetryClass::WithBackoff);
    }

    #[tokio::test]
    async fn test_relay_error_page_is_cors() {
        let url = serve_once(
            "200 OK",
            "text/plain",
            "Origin https://app.test is not allowed by access control checks.",
        )
        .await;

        let err = local_transport().get_json(&request_to(url)).await.unwrap_err();
        assert!(matches!(err, FeedError::Cors { .. }), "{:?}", err);
        assert_eq!(err.retry_class(), RetryClass::EscalateProxy);
    }

    #[tokio::test]
    async fn test_non_json_success_is_invalid_body() {
        let url = serve_once("200 OK", "text/html", "<html>maintenance</html>").await;

        let err = local_transport().get_json(&request_to(url)).await.unwrap_err();
        assert!(matches!(err, FeedError::InvalidBody { .. }), "{:?}", err);
        assert_eq!(err.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let body = "x".repeat(2_000);
        assert_eq!(excerpt(&body).len(), MAX_ERROR_BODY);
        assert_eq!(excerpt("short"), "short");
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_who_indicator_list() {
        use crate::upstream::{FeedRequest, ProxyTier, Upstream};
        use std::sync::Arc;

        let upstream = Arc::new(Upstream::who_gho("https://ghoapi.azureedge.net/api"));
        let request = FeedRequest::new(upstream, "Indicator").param("$top", "1");
        let transport = ReqwestTransport::new();
        let body = transport
            .get_json(&request.http_request(ProxyTier::Direct).unwrap())
            .await
            .unwrap();
        assert!(body.get("value").is_some());
    }
}
