use super::core::SriClient;
use super::OPERATIONS;
use crate::cache::{CacheBackend, CacheConfig, CacheKeyGenerator, CacheManager, MemoryCache};
use crate::config::{ClientConfig, DatabaseConfig};
use crate::db::QueryExecutor;
use crate::graphql::GraphQlCatalog;
use crate::params::ParameterExtractor;
use crate::transport::HttpTransport;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builder for [`SriClient`].
///
/// Anything not set falls back to a default: an in-memory LRU cache, the
/// embedded GraphQL catalog and a parameter extractor with the client's own
/// operation signatures.
pub struct SriClientBuilder {
    config: ClientConfig,
    cache_backend: Option<Arc<dyn CacheBackend>>,
    cache_config: CacheConfig,
    key_salt: Option<String>,
    extractor: Option<Arc<ParameterExtractor>>,
    catalog: Option<Arc<GraphQlCatalog>>,
    executor: Option<Arc<dyn QueryExecutor>>,
}

impl SriClientBuilder {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(api_url, api_key))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            cache_backend: None,
            cache_config: CacheConfig::default(),
            key_salt: None,
            extractor: None,
            catalog: None,
            executor: None,
        }
    }

    /// Value of the `Accept-Language` header (default `sk_SK`).
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl_secs = ttl.as_secs();
        self
    }

    pub fn nsz_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.nsz_cache_ttl_secs = ttl.as_secs();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_secs = timeout.as_secs();
        self
    }

    pub fn database(mut self, database: DatabaseConfig) -> Self {
        self.config.database = Some(database);
        self
    }

    /// Use a shared or custom cache store.
    pub fn cache_backend(mut self, backend: Arc<dyn CacheBackend>) -> Self {
        self.cache_backend = Some(backend);
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    pub fn cache_key_salt(mut self, salt: impl Into<String>) -> Self {
        self.key_salt = Some(salt.into());
        self
    }

    /// Share one extractor between clients. It must know every operation in
    /// [`OPERATIONS`](super::OPERATIONS).
    pub fn parameter_extractor(mut self, extractor: Arc<ParameterExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn catalog(mut self, catalog: GraphQlCatalog) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    /// Run database lookups through `executor` instead of connecting from
    /// the configuration.
    pub fn query_executor(mut self, executor: Arc<dyn QueryExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub async fn build(self) -> Result<SriClient> {
        self.config.validate()?;

        let transport = Arc::new(HttpTransport::new(&self.config)?);

        let backend = self
            .cache_backend
            .unwrap_or_else(|| Arc::new(MemoryCache::default()));
        let cache = Arc::new(CacheManager::new(self.cache_config, backend));

        let mut keys = CacheKeyGenerator::new();
        if let Some(salt) = self.key_salt {
            keys = keys.with_salt(salt);
        }

        let params = match self.extractor {
            Some(extractor) => {
                if let Some(missing) = OPERATIONS
                    .iter()
                    .find(|op| !extractor.is_registered(op.operation))
                {
                    return Err(Error::configuration_with_context(
                        "parameter extractor lacks a client operation",
                        ErrorContext::new()
                            .with_field_path(missing.operation)
                            .with_source("client_builder"),
                    ));
                }
                extractor
            }
            None => Arc::new(ParameterExtractor::with_signatures(OPERATIONS)),
        };

        let catalog = match self.catalog {
            Some(catalog) => {
                catalog.validate()?;
                catalog
            }
            None => GraphQlCatalog::embedded()?,
        };

        let executor = match self.executor {
            Some(executor) => Some(executor),
            None => connect_database(&self.config).await?,
        };

        info!(
            api_url = %self.config.api_url,
            cache = cache.backend_name(),
            database = executor.as_ref().map(|e| e.name()).unwrap_or("none"),
            "sri client ready"
        );

        Ok(SriClient {
            config: self.config,
            transport,
            cache,
            keys,
            params,
            catalog,
            executor,
        })
    }
}

#[cfg(feature = "postgres")]
async fn connect_database(config: &ClientConfig) -> Result<Option<Arc<dyn QueryExecutor>>> {
    match config.database {
        Some(ref db) => {
            let executor = crate::db::postgres::PgQueryExecutor::connect(db).await?;
            Ok(Some(Arc::new(executor)))
        }
        None => Ok(None),
    }
}

#[cfg(not(feature = "postgres"))]
async fn connect_database(config: &ClientConfig) -> Result<Option<Arc<dyn QueryExecutor>>> {
    if config.database.is_some() {
        tracing::warn!("database configured but the `postgres` feature is disabled; database lookups are unavailable");
    }
    Ok(None)
}
