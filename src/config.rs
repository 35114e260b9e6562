//! Client configuration.
//!
//! A [`ClientConfig`] can be built in code, read from the environment
//! ([`ClientConfig::from_env`]) or loaded from a YAML file
//! ([`ClientConfig::from_yaml_file`]). Every constructor path ends in
//! [`ClientConfig::validate`].

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_LANGUAGE: &str = "sk_SK";
/// 15 minutes.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 900;
/// 24 hours; NSZ records change rarely.
pub const DEFAULT_NSZ_CACHE_TTL_SECS: u64 = 86_400;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DB_PORT: u16 = 5432;

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}
fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}
fn default_nsz_cache_ttl_secs() -> u64 {
    DEFAULT_NSZ_CACHE_TTL_SECS
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_db_port() -> u16 {
    DEFAULT_DB_PORT
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_nsz_cache_ttl_secs")]
    pub nsz_cache_ttl_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
}

// Keep credentials out of logs.
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"***")
            .field("language", &self.language)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("nsz_cache_ttl_secs", &self.nsz_cache_ttl_secs)
            .field("timeout_secs", &self.timeout_secs)
            .field("database", &self.database)
            .finish()
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            language: default_language(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            nsz_cache_ttl_secs: DEFAULT_NSZ_CACHE_TTL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            database: None,
        }
    }

    /// Read configuration from `SRI_*` environment variables.
    ///
    /// `SRI_URL` and `SRI_API_KEY` are required. A database section is
    /// configured only when `SRI_DB_HOST` is set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(required_env("SRI_URL")?, required_env("SRI_API_KEY")?);
        if let Ok(language) = env::var("SRI_LANGUAGE") {
            config.language = language;
        }
        if let Some(ttl) = parsed_env::<u64>("SRI_CACHE_TTL")? {
            config.cache_ttl_secs = ttl;
        }
        if let Some(ttl) = parsed_env::<u64>("SRI_NSZ_CACHE_TTL")? {
            config.nsz_cache_ttl_secs = ttl;
        }
        if let Some(timeout) = parsed_env::<u64>("SRI_HTTP_TIMEOUT_SECS")? {
            config.timeout_secs = timeout;
        }
        if let Ok(host) = env::var("SRI_DB_HOST") {
            config.database = Some(DatabaseConfig {
                host,
                port: parsed_env::<u16>("SRI_DB_PORT")?.unwrap_or(DEFAULT_DB_PORT),
                user: env::var("SRI_DB_USER").unwrap_or_default(),
                password: env::var("SRI_DB_PASSWORD").unwrap_or_default(),
                database: env::var("SRI_DB_NAME").unwrap_or_default(),
            });
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| {
            Error::configuration_with_context(
                "invalid configuration document",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("client_config"),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                "cannot read configuration file",
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_details(e.to_string())
                    .with_source("client_config"),
            )
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_database(mut self, database: DatabaseConfig) -> Self {
        self.database = Some(database);
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn nsz_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.nsz_cache_ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check every field that would otherwise fail late, at request time.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api_url)
            .map_err(|e| invalid("api_url", format!("{} ({})", e, self.api_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(
                "api_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.api_key.trim().is_empty() {
            return Err(invalid("api_key", "must not be empty"));
        }
        if self.language.trim().is_empty() {
            return Err(invalid("language", "must not be empty"));
        }
        if self.cache_ttl_secs == 0 {
            return Err(invalid("cache_ttl_secs", "must be greater than zero"));
        }
        if self.nsz_cache_ttl_secs == 0 {
            return Err(invalid("nsz_cache_ttl_secs", "must be greater than zero"));
        }
        if let Some(db) = &self.database {
            db.validate()?;
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(invalid("database.host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(invalid("database.port", "must not be zero"));
        }
        if self.user.trim().is_empty() {
            return Err(invalid("database.user", "must not be empty"));
        }
        if self.database.trim().is_empty() {
            return Err(invalid("database.database", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &str, details: impl Into<String>) -> Error {
    Error::configuration_with_context(
        format!("invalid value for '{}'", field),
        ErrorContext::new()
            .with_field_path(field)
            .with_details(details)
            .with_source("client_config"),
    )
}

fn required_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| {
        Error::configuration_with_context(
            format!("environment variable {} is not set", name),
            ErrorContext::new()
                .with_field_path(name)
                .with_source("client_config"),
        )
    })
}

fn parsed_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(name, format!("cannot parse '{}'", raw))),
        Err(_) => Ok(None),
    }
}
