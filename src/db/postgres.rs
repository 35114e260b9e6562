//! PostgreSQL executor backed by sqlx.

use super::{BoundQuery, QueryExecutor, SqlParam};
use crate::config::DatabaseConfig;
use crate::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{debug, info};

/// Holds a single connection for its whole lifetime.
pub struct PgQueryExecutor {
    pool: PgPool,
}

impl PgQueryExecutor {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        config.validate()?;
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .connect_with(options)
            .await?;
        info!(host = %config.host, database = %config.database, "connected to database");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Wrap `sql` so the server returns the whole row set as one JSON array.
fn as_json_rows(sql: &str) -> String {
    format!(
        "SELECT COALESCE(json_agg(q), '[]'::json)::text FROM ({}) AS q",
        sql.trim().trim_end_matches(';')
    )
}

#[async_trait]
impl QueryExecutor for PgQueryExecutor {
    async fn fetch_json(&self, query: &BoundQuery) -> Result<String> {
        let sql = as_json_rows(&query.sql);
        debug!(binds = query.binds.len(), "database query");
        let mut statement = sqlx::query_scalar::<_, String>(&sql);
        for bind in &query.binds {
            statement = match bind {
                SqlParam::Int(v) => statement.bind(*v),
                SqlParam::Text(v) => statement.bind(v.clone()),
                SqlParam::Null => statement.bind(None::<String>),
            };
        }
        Ok(statement.fetch_one(&self.pool).await?)
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}
