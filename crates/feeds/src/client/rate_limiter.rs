//! Fixed-window rate limiter for statistical upstreams.
//!
//! Each rate-limited upstream gets a window that allows a fixed number of
//! requests. Every attempt counts, successful or not. When the window is
//! full, callers wait (asynchronously) until it resets.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

/// Default limit: 50 requests per window.
const DEFAULT_MAX_REQUESTS: u32 = 50;

/// Default window length: one minute.
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Request window for a single upstream.
#[derive(Debug)]
struct RateLimitWindow {
    /// Requests counted in the current window.
    count: u32,
    /// When the current window ends.
    window_reset_at: Instant,
    /// Maximum requests per window.
    max_requests: u32,
    /// Window length.
    window: Duration,
}

impl RateLimitWindow {
    /// Create a window that is already expired at `now`, so the first request opens a fresh one.
    fn with_config(config: &RateLimitConfig, now: Instant) -> Self {
        Self {
            count: 0,
            window_reset_at: now,
            max_requests: config.max_requests,
            window: config.window,
        }
    }

    /// Start a new window if the current one has ended.
    fn roll(&mut self, now: Instant) {
        if now >= self.window_reset_at {
            self.count = 0;
            self.window_reset_at = now + self.window;
        }
    }

    /// Count a request if the window has room.
    fn try_acquire(&mut self, now: Instant) -> bool {
        self.roll(now);

        if self.count >= self.max_requests {
            false
        } else {
            self.count += 1;
            true
        }
    }

    fn time_until_reset(&self, now: Instant) -> Duration {
        self.window_reset_at.saturating_duration_since(now)
    }

    fn remaining(&mut self, now: Instant) -> u32 {
        self.roll(now);
        self.max_requests.saturating_sub(self.count)
    }
}

/// Rate limit configuration for an upstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Fixed-window rate limiter for multiple upstreams.
///
/// Thread-safe; meant to be created once at startup and shared by every
/// feed client that talks to the same upstreams. Windows are created on
/// demand with the configured (or default) limits.
pub struct RateLimiter {
    /// Per-upstream request windows.
    windows: Mutex<HashMap<String, RateLimitWindow>>,
    /// Per-upstream configuration overrides.
    configs: Mutex<HashMap<String, RateLimitConfig>>,
}

impl RateLimiter {
    /// Create a new rate limiter with default settings.
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            configs: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the windows mutex, recovering from poison if necessary.
    ///
    /// A poisoned window map only means a slightly wrong count.
    fn lock_windows(&self) -> MutexGuard<'_, HashMap<String, RateLimitWindow>> {
        self.windows.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter windows mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Lock the configs mutex, recovering from poison if necessary.
    fn lock_configs(&self) -> MutexGuard<'_, HashMap<String, RateLimitConfig>> {
        self.configs.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter configs mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Configure limits for a specific upstream.
    pub fn configure(&self, upstream: &str, config: RateLimitConfig) {
        let mut configs = self.lock_configs();
        configs.insert(upstream.to_string(), config);
        drop(configs); // Release configs lock before acquiring windows lock

        // Reset the window if it already exists
        let mut windows = self.lock_windows();
        windows.remove(upstream);
    }

    /// Configure `upstream` with `config` unless it already has limits.
    fn configure_if_absent(&self, upstream: &str, config: &RateLimitConfig) {
        let mut configs = self.lock_configs();
        configs
            .entry(upstream.to_string())
            .or_insert_with(|| config.clone());
    }

    /// Count a request for `upstream`, registering `config` on first use.
    pub async fn acquire_for(&self, upstream: &str, config: &RateLimitConfig) {
        self.configure_if_absent(upstream, config);
        self.acquire(upstream).await;
    }

    /// Count a request for the given upstream.
    ///
    /// Waits (asynchronously) for the window to reset when it is full.
    pub async fn acquire(&self, upstream: &str) {
        loop {
            let wait_time = {
                let now = Instant::now();
                let mut windows = self.lock_windows();

                let window = windows
                    .entry(upstream.to_string())
                    .or_insert_with(|| self.create_window(upstream, now));

                if window.try_acquire(now) {
                    debug!(
                        "Rate limiter: '{}' request count {}/{}",
                        upstream, window.count, window.max_requests
                    );
                    return;
                }

                window.time_until_reset(now)
            };

            warn!(
                "Rate limit reached for '{}'. Waiting {} seconds",
                upstream,
                wait_time.as_secs_f64().ceil()
            );
            tokio::time::sleep(wait_time).await;
        }
    }

    /// Count a request without waiting.
    ///
    /// Returns true if the request fits in the current window.
    pub fn try_acquire(&self, upstream: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.lock_windows();

        let window = windows
            .entry(upstream.to_string())
            .or_insert_with(|| self.create_window(upstream, now));

        window.try_acquire(now)
    }

    /// Requests still available in the current window.
    pub fn remaining(&self, upstream: &str) -> u32 {
        let mut windows = self.lock_windows();

        if let Some(window) = windows.get_mut(upstream) {
            window.remaining(Instant::now())
        } else {
            self.config_for(upstream).max_requests
        }
    }

    /// Reset the window for an upstream.
    pub fn reset(&self, upstream: &str) {
        let mut windows = self.lock_windows();
        windows.remove(upstream);
    }

    fn config_for(&self, upstream: &str) -> RateLimitConfig {
        let configs = self.lock_configs();
        configs.get(upstream).cloned().unwrap_or_default()
    }

    /// Create a window for an upstream, using custom config if available.
    fn create_window(&self, upstream: &str, now: Instant) -> RateLimitWindow {
        RateLimitWindow::with_config(&self.config_for(upstream), now)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
