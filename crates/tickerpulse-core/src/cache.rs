//! In-memory TTL cache for fetch results.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default time-to-live for cached results.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Defines the behavior of the cache for one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Read from the cache if a non-expired entry is present;
    /// otherwise fetch and write the result to the cache. (Default)
    #[default]
    Use,
    /// Always fetch, ignoring any cached entry, and write the new result.
    Refresh,
    /// Always fetch and neither read nor write the cache.
    Bypass,
}

/// Deterministic cache key: an operation name plus ordered parameters.
///
/// ```
/// use tickerpulse_core::CacheKey;
///
/// let key = CacheKey::new("latest").param("tickers", "AAPL,MSFT").param("period", "30d");
/// assert_eq!(key.as_str(), "latest?tickers=AAPL,MSFT&period=30d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(operation: &str) -> Self {
        Self(operation.to_owned())
    }

    pub fn param(mut self, name: &str, value: impl fmt::Display) -> Self {
        let separator = if self.0.contains('?') { '&' } else { '?' };
        self.0.push(separator);
        self.0.push_str(name);
        self.0.push('=');
        self.0.push_str(&value.to_string());
        self
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now <= expires_at)
    }
}

#[derive(Debug)]
struct CacheInner<V> {
    map: HashMap<CacheKey, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<V: Clone> CacheInner<V> {
    fn get(&self, key: &CacheKey) -> Option<V> {
        self.map
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    fn put(&mut self, key: CacheKey, value: V, ttl_override: Option<Duration>) {
        let ttl = ttl_override.unwrap_or(self.default_ttl);
        let expires_at = Instant::now().checked_add(ttl);
        self.map.insert(key, CacheEntry { value, expires_at });
    }
}

/// Thread-safe TTL cache shared between clones.
#[derive(Debug)]
pub struct TtlCache<V> {
    inner: Arc<tokio::sync::RwLock<CacheInner<V>>>,
}

impl<V> Clone for TtlCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache with a default TTL. A zero TTL disables it.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                default_ttl,
            })),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Cached value for `key` if present and not expired.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        self.inner.read().await.get(key)
    }

    /// Store a value. No-op when the cache is disabled.
    pub async fn put(&self, key: CacheKey, value: V, ttl_override: Option<Duration>) {
        let mut store = self.inner.write().await;
        if store.default_ttl.is_zero() {
            return;
        }
        store.put(key, value, ttl_override);
    }

    /// Resolve `key` according to `mode`, awaiting `fetch` on a miss.
    ///
    /// The lock is not held while `fetch` runs, so two concurrent misses for
    /// the same key both fetch and the later write wins.
    pub async fn get_or_fetch<F>(&self, key: &CacheKey, mode: CacheMode, fetch: F) -> V
    where
        F: Future<Output = V>,
    {
        if mode == CacheMode::Use {
            if let Some(value) = self.get(key).await {
                tracing::debug!(key = %key, "cache hit");
                return value;
            }
        }

        let value = fetch.await;
        if mode != CacheMode::Bypass {
            self.put(key.clone(), value.clone(), None).await;
        }
        value
    }

    /// Remove expired entries.
    pub async fn clear_expired(&self) {
        let now = Instant::now();
        self.inner
            .write()
            .await
            .map
            .retain(|_, entry| entry.is_live(now));
    }

    pub async fn clear(&self) {
        self.inner.write().await.map.clear();
    }

    /// Number of entries, including expired ones not yet cleared.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_disabled(&self) -> bool {
        self.inner.read().await.default_ttl.is_zero()
    }
}
