//! Cached relational lookups.

use super::core::SriClient;
use crate::db::{bind_named, query_arguments, SqlParam};
use crate::{Error, ErrorContext, Result};
use serde_json::Value;

impl SriClient {
    /// Run `sql` with `:name` binds and return the rows as a JSON array,
    /// cached under `namespace` for the default TTL.
    pub async fn query_rows(
        &self,
        namespace: &str,
        sql: &str,
        params: &[(&str, SqlParam)],
    ) -> Result<Value> {
        let executor = self.executor.as_ref().ok_or_else(|| {
            Error::configuration_with_context(
                "no database configured",
                ErrorContext::new()
                    .with_field_path(namespace)
                    .with_source("query_rows"),
            )
        })?;
        let bound = bind_named(sql, params)?;
        let args = query_arguments(sql, params);
        let bound = &bound;
        self.fetch(namespace, &args, self.config.cache_ttl(), move || {
            executor.fetch_json(bound)
        })
        .await
    }
}
