//! Cache backend implementations.

use super::key::CacheKey;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Far enough in the future to never expire in practice.
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

#[derive(Clone)]
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            data,
            expires_at: now
                .checked_add(ttl)
                .unwrap_or_else(|| now + MAX_TTL),
        }
    }
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Key-value store with per-entry TTL.
///
/// `get` and `set` are atomic per entry; nothing more is assumed of a backend.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Live (unexpired) payload for `key`.
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<()>;
    async fn exists(&self, key: &CacheKey) -> Result<bool>;
    async fn clear(&self) -> Result<()>;
    async fn len(&self) -> Result<usize>;
    fn name(&self) -> &'static str;
}

/// In-memory LRU store. Expired entries are dropped lazily.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        let cap = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(cap)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LruCache<String, CacheEntry>>> {
        self.entries.lock().map_err(|_| {
            Error::cache_with_context(
                "memory cache lock poisoned",
                ErrorContext::new().with_source("memory_cache"),
            )
        })
    }

    fn purge_expired(entries: &mut LruCache<String, CacheEntry>, now: Instant) {
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for k in expired {
            entries.pop(&k);
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        let expired = match entries.get(key.as_str()) {
            Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.data.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key.as_str());
        }
        Ok(None)
    }

    async fn set(&self, key: &CacheKey, value: &[u8], ttl: Duration) -> Result<()> {
        let mut entries = self.lock()?;
        if entries.len() >= entries.cap().get() {
            Self::purge_expired(&mut entries, Instant::now());
        }
        entries.put(key.as_str().to_string(), CacheEntry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        let entries = self.lock()?;
        let now = Instant::now();
        Ok(entries
            .peek(key.as_str())
            .map(|e| !e.is_expired(now))
            .unwrap_or(false))
    }

    async fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let entries = self.lock()?;
        let now = Instant::now();
        Ok(entries.iter().filter(|(_, e)| !e.is_expired(now)).count())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Stores nothing; every lookup misses.
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn get(&self, _: &CacheKey) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
    async fn set(&self, _: &CacheKey, _: &[u8], _: Duration) -> Result<()> {
        Ok(())
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
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> CacheKey {
        CacheKey::new("test", name)
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new(8);
        cache
            .set(&key("a"), b"payload", Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(cache.get(&key("a")).await.unwrap(), Some(b"payload".to_vec()));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(cache.exists(&key("a")).await.unwrap());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&key("a")).await.unwrap(), None);
        assert_eq!(cache.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_least_recently_used_is_evicted() {
        let cache = MemoryCache::new(2);
        let ttl = Duration::from_secs(60);
        cache.set(&key("a"), b"1", ttl).await.unwrap();
        cache.set(&key("b"), b"2", ttl).await.unwrap();
        // touch "a" so "b" becomes the eviction candidate
        cache.get(&key("a")).await.unwrap();
        cache.set(&key("c"), b"3", ttl).await.unwrap();

        assert!(cache.exists(&key("a")).await.unwrap());
        assert!(!cache.exists(&key("b")).await.unwrap());
        assert!(cache.exists(&key("c")).await.unwrap());
        assert_eq!(cache.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_overwrite_and_clear() {
        let cache = MemoryCache::default();
        let ttl = Duration::from_secs(60);
        cache.set(&key("a"), b"old", ttl).await.unwrap();
        cache.set(&key("a"), b"new", ttl).await.unwrap();
        assert_eq!(cache.get(&key("a")).await.unwrap(), Some(b"new".to_vec()));
        cache.clear().await.unwrap();
        assert_eq!(cache.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_null_cache_never_stores() {
        let cache = NullCache::new();
        cache
            .set(&key("a"), b"x", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get(&key("a")).await.unwrap(), None);
        assert_eq!(cache.name(), "null");
    }
}
