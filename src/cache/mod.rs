//! Read-through response caching.
//!
//! Every lookup is keyed by a [`CacheKey`]: an operation namespace plus a
//! digest of the effective arguments. [`CacheManager::get_or_compute`] returns
//! the live entry for a key or runs the supplied request, stores its raw JSON
//! body for the given TTL and hands back the decoded value.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheManager`] | Cache-aside front with statistics |
//! | [`CacheConfig`] | Enable switch, size limit, key prefix |
//! | [`CacheBackend`] | Trait for custom stores |
//! | [`MemoryCache`] | In-memory LRU store |
//! | [`NullCache`] | No-op store |
//! | [`CacheKeyGenerator`] | Fingerprints argument sets |
//!
//! ```rust
//! use sri_client::cache::{CacheConfig, CacheManager, MemoryCache};
//! use std::sync::Arc;
//!
//! let cache = CacheManager::new(CacheConfig::default(), Arc::new(MemoryCache::new(1000)));
//! assert_eq!(cache.backend_name(), "memory");
//! ```

mod backend;
mod key;
mod manager;

pub use backend::{CacheBackend, MemoryCache, NullCache};
pub use key::{fingerprint, CacheKey, CacheKeyGenerator};
pub use manager::{CacheConfig, CacheManager, CacheStats};
