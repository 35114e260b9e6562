use crate::cache::{CacheKey, CacheKeyGenerator, CacheManager};
use crate::config::ClientConfig;
use crate::db::QueryExecutor;
use crate::graphql::GraphQlCatalog;
use crate::params::{ArgumentSet, ParameterExtractor};
use crate::transport::HttpTransport;
use crate::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::builder::SriClientBuilder;

/// Read-through client for the SRI API and database.
///
/// Cheap to share behind an `Arc`; the cache is the only mutable state.
pub struct SriClient {
    pub(crate) config: ClientConfig,
    pub(crate) transport: Arc<HttpTransport>,
    pub(crate) cache: Arc<CacheManager>,
    pub(crate) keys: CacheKeyGenerator,
    pub(crate) params: Arc<ParameterExtractor>,
    pub(crate) catalog: Arc<GraphQlCatalog>,
    pub(crate) executor: Option<Arc<dyn QueryExecutor>>,
}

impl SriClient {
    pub fn builder(api_url: impl Into<String>, api_key: impl Into<String>) -> SriClientBuilder {
        SriClientBuilder::new(api_url, api_key)
    }

    /// Build a client from a complete configuration with default collaborators.
    pub async fn new(config: ClientConfig) -> Result<Self> {
        SriClientBuilder::from_config(config).build().await
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub fn catalog(&self) -> &GraphQlCatalog {
        &self.catalog
    }

    pub fn has_database(&self) -> bool {
        self.executor.is_some()
    }

    pub fn cache_key(&self, namespace: &str, args: &ArgumentSet) -> CacheKey {
        self.keys.generate(namespace, args)
    }

    /// Read-through access: return the live cached payload for
    /// (`namespace`, `args`) or run `compute`, cache its raw JSON for `ttl`
    /// and return it decoded.
    pub async fn fetch<T, F, Fut>(
        &self,
        namespace: &str,
        args: &ArgumentSet,
        ttl: Duration,
        compute: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let key = self.cache_key(namespace, args);
        self.cache.get_or_compute(&key, ttl, compute).await
    }

    /// Cached GET of `path`.
    pub(crate) async fn cached_get(
        &self,
        namespace: &str,
        args: &ArgumentSet,
        ttl: Duration,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value> {
        let transport = &self.transport;
        self.fetch(namespace, args, ttl, move || transport.get(path, Some(query)))
            .await
    }

    /// Effective arguments of a declared operation.
    pub(crate) fn bind(&self, operation: &str, values: &[Option<Value>]) -> Result<ArgumentSet> {
        self.params.bind(operation, values)
    }
}
