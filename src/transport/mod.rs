//! Remote API gateway.
//!
//! [`HttpTransport`] issues authenticated REST and GraphQL requests against the
//! SRI API. Every request carries the API key and language headers; any
//! non-2xx answer becomes [`TransportError::Status`].

mod http;

pub use http::{HttpTransport, Method, GRAPHQL_PATH};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status} from {url}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Status code of a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Http(e) => e.status().map(|s| s.as_u16()),
            TransportError::Other(_) => None,
        }
    }
}
