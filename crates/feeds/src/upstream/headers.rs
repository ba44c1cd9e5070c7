//! HTTP headers sent to statistical upstreams.
//!
//! Only headers a browser relay would also let through are used, so the same
//! request works directly and through the proxy tiers.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

/// Accept-Language used when nothing more specific applies.
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Statistics Canada serves Canadian English.
pub const STATCAN_ACCEPT_LANGUAGE: &str = "en-CA,en;q=0.9";

/// WHO GHO serves US English.
pub const WHO_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Create the fixed header set for an upstream request.
pub fn safe_headers(accept_language: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(accept_language));
    headers
}
