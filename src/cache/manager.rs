//! Cache manager.

use super::backend::CacheBackend;
use super::key::CacheKey;
use crate::Result;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entry_size: usize,
    pub key_prefix: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entry_size: 10 * 1024 * 1024,
            key_prefix: None,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
    pub fn with_max_entry_size(mut self, bytes: usize) -> Self {
        self.max_entry_size = bytes;
        self
    }
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Cache-aside front for a [`CacheBackend`].
pub struct CacheManager {
    config: CacheConfig,
    backend: Arc<dyn CacheBackend>,
    stats: AtomicStats,
}

impl CacheManager {
    pub fn new(config: CacheConfig, backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            config,
            backend,
            stats: AtomicStats::new(),
        }
    }

    /// Return the live entry for `key` decoded as `T`, or run `compute`,
    /// decode its raw JSON, store it for `ttl` and return it.
    ///
    /// Failures of `compute` and undecodable payloads are returned to the
    /// caller and never stored. Concurrent misses on one key each run
    /// `compute`; the last write wins.
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let key = self.prefix_key(key);

        if self.config.enabled {
            match self.backend.get(&key).await {
                Ok(Some(data)) => match serde_json::from_slice::<T>(&data) {
                    Ok(value) => {
                        self.stats.hits.fetch_add(1, Ordering::Relaxed);
                        debug!(key = %key, "cache hit");
                        return Ok(value);
                    }
                    Err(e) => {
                        self.stats.errors.fetch_add(1, Ordering::Relaxed);
                        warn!(key = %key, error = %e, "discarding undecodable cached payload");
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    return Err(e);
                }
            }
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "cache miss");
        }

        let raw = compute().await?;
        let value: T = serde_json::from_str(&raw)?;

        if self.config.enabled {
            if raw.len() > self.config.max_entry_size {
                warn!(key = %key, size = raw.len(), "payload exceeds max entry size, not cached");
            } else {
                match self.backend.set(&key, raw.as_bytes(), ttl).await {
                    Ok(()) => {
                        self.stats.sets.fetch_add(1, Ordering::Relaxed);
                    }
                    // The value is already computed; a failed store only costs a later miss.
                    Err(e) => {
                        self.stats.errors.fetch_add(1, Ordering::Relaxed);
                        warn!(key = %key, error = %e, "failed to store computed payload");
                    }
                }
            }
        }

        Ok(value)
    }

    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn prefix_key(&self, key: &CacheKey) -> CacheKey {
        match self.config.key_prefix {
            Some(ref p) => key.prefixed(p),
            None => key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, NullCache};
    use crate::Error;
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;

    fn manager(config: CacheConfig) -> CacheManager {
        CacheManager::new(config, Arc::new(MemoryCache::new(16)))
    }

    async fn counted(
        cache: &CacheManager,
        key: &CacheKey,
        ttl: Duration,
        calls: &AtomicUsize,
        body: &str,
    ) -> Result<Value> {
        cache
            .get_or_compute(key, ttl, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(body.to_string())
            })
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_compute_runs_once_within_ttl_and_again_after() {
        let cache = manager(CacheConfig::default());
        let key = CacheKey::new("nsz-by-id", "k");
        let ttl = Duration::from_secs(86_400);
        let calls = AtomicUsize::new(0);

        let first = counted(&cache, &key, ttl, &calls, r#"{"id":42}"#).await.unwrap();
        let second = counted(&cache, &key, ttl, &calls, r#"{"id":42}"#).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(first, json!({"id": 42}));

        tokio::time::advance(ttl).await;
        counted(&cache, &key, ttl, &calls, r#"{"id":42}"#).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.sets, 2);
    }

    #[tokio::test]
    async fn test_decode_failure_is_not_cached() {
        let cache = manager(CacheConfig::default());
        let key = CacheKey::new("broken", "k");
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        let err = counted(&cache, &key, ttl, &calls, "<html>").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        let err = counted(&cache, &key, ttl, &calls, "<html>").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().sets, 0);
    }

    #[tokio::test]
    async fn test_compute_error_propagates_uncached() {
        let cache = manager(CacheConfig::default());
        let key = CacheKey::new("failing", "k");
        let result: Result<Value> = cache
            .get_or_compute(&key, Duration::from_secs(60), || async {
                Err(Error::lookup_with_context("boom", Default::default()))
            })
            .await;
        assert!(matches!(result, Err(Error::Lookup { .. })));
        assert_eq!(cache.stats().sets, 0);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_computes() {
        let cache = manager(CacheConfig::new().with_enabled(false));
        let key = CacheKey::new("x", "k");
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);
        counted(&cache, &key, ttl, &calls, "[]").await.unwrap();
        counted(&cache, &key, ttl, &calls, "[]").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_oversized_payload_is_returned_but_not_stored() {
        let cache = manager(CacheConfig::new().with_max_entry_size(4));
        let key = CacheKey::new("big", "k");
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);
        let value = counted(&cache, &key, ttl, &calls, "[1,2,3]").await.unwrap();
        assert_eq!(value, json!([1, 2, 3]));
        counted(&cache, &key, ttl, &calls, "[1,2,3]").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_typed_decode() {
        #[derive(serde::Deserialize)]
        struct Nsz {
            id: i64,
        }
        let cache = CacheManager::new(CacheConfig::default(), Arc::new(NullCache::new()));
        let nsz: Nsz = cache
            .get_or_compute(&CacheKey::new("nsz", "k"), Duration::from_secs(1), || async {
                Ok(r#"{"id":7,"title":"x"}"#.to_string())
            })
            .await
            .unwrap();
        assert_eq!(nsz.id, 7);
    }

    #[tokio::test]
    async fn test_key_prefix_is_applied() {
        let backend = Arc::new(MemoryCache::new(4));
        let cache = CacheManager::new(
            CacheConfig::new().with_key_prefix("sri"),
            backend.clone(),
        );
        let key = CacheKey::new("nsz-by-id", "k");
        let _: Value = cache
            .get_or_compute(&key, Duration::from_secs(60), || async { Ok("{}".to_string()) })
            .await
            .unwrap();
        assert!(backend.exists(&key.prefixed("sri")).await.unwrap());
        assert!(!backend.exists(&key).await.unwrap());
    }

    struct ReadOnlyStore;

    #[async_trait::async_trait]
    impl CacheBackend for ReadOnlyStore {
        async fn get(&self, _: &CacheKey) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }
        async fn set(&self, _: &CacheKey, _: &[u8], _: Duration) -> Result<()> {
            Err(Error::cache_with_context(
                "store is read-only",
                crate::ErrorContext::new().with_source("read_only_store"),
            ))
        }
        async fn exists(&self, _: &CacheKey) -> Result<bool> {
            Ok(false)
        }
        async fn clear(&self) -> Result<()> {
            Ok(())
        }
        async fn len(&self) -> Result<usize> {
            Ok(0)
        }
        fn name(&self) -> &'static str {
            "read-only"
        }
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_computed_value() {
        let cache = CacheManager::new(CacheConfig::default(), Arc::new(ReadOnlyStore));
        let key = CacheKey::new("nsz-by-id", "k");
        let calls = AtomicUsize::new(0);

        let value = counted(&cache, &key, Duration::from_secs(60), &calls, r#"{"id":1}"#)
            .await
            .unwrap();
        assert_eq!(value, json!({"id": 1}));
        assert_eq!(cache.stats().errors, 1);
        assert_eq!(cache.stats().sets, 0);
    }
}
