use crate::graphql::GraphQlError;
use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for lookup, configuration and cache failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "database.port", "search_organization")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected value, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "parameter_extractor", "client_config")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the SRI client.
///
/// Nothing is retried internally: every variant reaches the caller as-is.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    GraphQl(#[from] GraphQlError),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Lookup error: {message}{}", format_context(.context))]
    Lookup {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Cache error: {message}{}", format_context(.context))]
    Cache {
        message: String,
        context: ErrorContext,
    },

    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn lookup_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Lookup {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn cache_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Cache {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Lookup { context, .. }
            | Error::Configuration { context, .. }
            | Error::Cache { context, .. } => Some(context),
            _ => None,
        }
    }

    /// HTTP status code of a non-2xx response, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// True when the remote API answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
