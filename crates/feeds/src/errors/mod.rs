//! Error types and retry classification for the feeds crate.
//!
//! This module provides:
//! - [`FeedError`]: The error enum for every transport-level failure
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching an upstream feed.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which determines how the feed client should handle the error.
/// Only transport-level problems live here; the shape of a successfully
/// decoded JSON body is never an error at this layer.
#[derive(Error, Debug)]
pub enum FeedError {
    /// The request to the upstream timed out.
    /// Escalate to the next proxy tier.
    #[error("Timeout: {upstream}")]
    Timeout {
        /// The upstream that timed out
        upstream: String,
    },

    /// The connection could not be established or was dropped.
    /// Escalate to the next proxy tier.
    #[error("Network error: {upstream} - {message}")]
    Network {
        /// The upstream that could not be reached
        upstream: String,
        /// The underlying transport message
        message: String,
    },

    /// A cross-origin relay refused the request.
    /// Escalate to the next proxy tier.
    #[error("CORS error: {upstream} - {message}")]
    Cors {
        /// The upstream behind the relay
        upstream: String,
        /// The message reported by the relay
        message: String,
    },

    /// The upstream rate limited the request (HTTP 429 or a rate limit message).
    /// Escalate to the next proxy tier.
    #[error("Rate limited: {upstream}")]
    RateLimited {
        /// The upstream that rate limited the request
        upstream: String,
    },

    /// The upstream answered with a non-success HTTP status.
    /// Retry with exponential backoff.
    #[error("HTTP {status}: {upstream}")]
    HttpStatus {
        /// The upstream that returned the status
        upstream: String,
        /// The HTTP status code
        status: u16,
        /// The response body, if one could be read
        body: Option<String>,
    },

    /// The response body could not be read or is not JSON.
    /// Retry with exponential backoff.
    #[error("Invalid response body: {upstream} - {message}")]
    InvalidBody {
        /// The upstream that returned the body
        upstream: String,
        /// Why the body was rejected
        message: String,
    },

    /// The request could not be built (bad base URL, bad header value).
    /// This is a terminal error - retrying won't help.
    #[error("Invalid request: {upstream} - {message}")]
    InvalidRequest {
        /// The upstream the request was meant for
        upstream: String,
        /// Why the request could not be built
        message: String,
    },

    /// Every attempt and every proxy tier failed.
    #[error("Fetch exhausted after {attempts} attempts: {upstream}")]
    Exhausted {
        /// The upstream that could not be fetched
        upstream: String,
        /// Total number of HTTP attempts made
        attempts: u32,
        /// The last error observed
        #[source]
        source: Box<FeedError>,
    },
}

impl FeedError {
    /// Returns the retry classification for this error.
    ///
    /// - [`RetryClass::EscalateProxy`]: Switch to the next proxy tier without
    ///   consuming a retry slot
    /// - [`RetryClass::WithBackoff`]: Retry the same tier after a backoff delay
    /// - [`RetryClass::Never`]: Don't retry, the error is terminal
    ///
    /// # Examples
    ///
    /// ```
    /// use mindscope_feeds::errors::{FeedError, RetryClass};
    ///
    /// let error = FeedError::RateLimited { upstream: "WHO_GHO".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::EscalateProxy);
    ///
    /// let error = FeedError::HttpStatus {
    ///     upstream: "STATCAN".to_string(),
    ///     status: 500,
    ///     body: None,
    /// };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Reachability problems - try another route to the same data
            Self::Timeout { .. }
            | Self::Network { .. }
            | Self::Cors { .. }
            | Self::RateLimited { .. } => RetryClass::EscalateProxy,

            // Upstream answered but badly - try again later
            Self::HttpStatus { .. } | Self::InvalidBody { .. } => RetryClass::WithBackoff,

            // Broken request or already exhausted
            Self::InvalidRequest { .. } | Self::Exhausted { .. } => RetryClass::Never,
        }
    }

    /// The upstream this error belongs to.
    pub fn upstream(&self) -> &str {
        match self {
            Self::Timeout { upstream }
            | Self::Network { upstream, .. }
            | Self::Cors { upstream, .. }
            | Self::RateLimited { upstream }
            | Self::HttpStatus { upstream, .. }
            | Self::InvalidBody { upstream, .. }
            | Self::InvalidRequest { upstream, .. }
            | Self::Exhausted { upstream, .. } => upstream,
        }
    }

    /// Short machine-readable code for the error kind, used in log context.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "TIMEOUT",
            Self::Network { .. } => "NETWORK",
            Self::Cors { .. } => "CORS",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::HttpStatus { .. } => "HTTP_STATUS",
            Self::InvalidBody { .. } => "INVALID_BODY",
            Self::InvalidRequest { .. } => "INVALID_REQUEST",
            Self::Exhausted { .. } => "FETCH_EXHAUSTED",
        }
    }

    /// The innermost error, following `Exhausted` wrappers.
    pub fn root_cause(&self) -> &FeedError {
        match self {
            Self::Exhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// HTTP status and body of the failing response, if the root cause was one.
    pub fn http_detail(&self) -> Option<(u16, Option<&str>)> {
        match self.root_cause() {
            Self::HttpStatus { status, body, .. } => Some((*status, body.as_deref())),
            Self::RateLimited { .. } => Some((429, None)),
            _ => None,
        }
    }

    /// Classify a `reqwest` failure for the given upstream.
    pub fn from_reqwest(upstream: &str, err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            Self::Timeout {
                upstream: upstream.to_string(),
            }
        } else if is_cors_message(&message) {
            Self::Cors {
                upstream: upstream.to_string(),
                message,
            }
        } else if is_rate_limit_message(&message) {
            Self::RateLimited {
                upstream: upstream.to_string(),
            }
        } else if err.is_builder() {
            Self::InvalidRequest {
                upstream: upstream.to_string(),
                message,
            }
        } else if err.is_decode() || err.is_body() {
            Self::InvalidBody {
                upstream: upstream.to_string(),
                message,
            }
        } else {
            Self::Network {
                upstream: upstream.to_string(),
                message,
            }
        }
    }
}

/// Relay proxies report blocked cross-origin requests in free text.
pub(crate) fn is_cors_message(message: &str) -> bool {
    message.contains("Access-Control-Allow-Headers") || message.contains("access control checks")
}

pub(crate) fn is_rate_limit_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("rate limit")
}
