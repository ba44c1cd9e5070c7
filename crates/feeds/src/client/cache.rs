//! In-memory response cache with TTL.
//!
//! Entries expire logically: a stale entry stays in the map until the next
//! miss for the same key overwrites it. Nothing is evicted proactively.
//! Concurrent misses on the same key may both fetch; the last write wins.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde_json::Value;

/// Default time-to-live: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// A cached raw response.
#[derive(Clone, Debug)]
struct CacheEntry {
    data: Value,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// TTL cache for raw upstream responses, keyed by URL and parameters.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    /// Create a new cache with the default one-hour TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Response cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Fresh cached data for `key`, if any.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.lock_entries();
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.ttl))
            .map(|entry| entry.data.clone())
    }

    /// Store `data` under `key`, overwriting any previous entry.
    pub fn insert(&self, key: impl Into<String>, data: Value) {
        let mut entries = self.lock_entries();
        entries.insert(
            key.into(),
            CacheEntry {
                data,
                stored_at: Instant::now(),
            },
        );
    }

    /// Return fresh cached data, or run `fetcher` and cache its result.
    ///
    /// The lock is never held across the fetch. Fetch errors are returned
    /// as-is and leave the cache untouched.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetcher: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(data) = self.get(key) {
            debug!("Cache hit for {}", key);
            return Ok(data);
        }

        debug!("Cache miss for {}, fetching fresh data", key);
        let data = fetcher().await?;
        self.insert(key, data.clone());
        Ok(data)
    }

    /// Whether `key` has an entry younger than the TTL.
    pub fn is_fresh(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove one entry.
    pub fn invalidate(&self, key: &str) {
        let mut entries = self.lock_entries();
        entries.remove(key);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut entries = self.lock_entries();
        entries.clear();
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}
