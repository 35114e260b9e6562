//! # sri-client
//!
//! Read-through client for the SRI occupational standards (NSZ) API and its
//! relational database.
//!
//! ## Overview
//!
//! Every lookup derives an effective argument set from what the caller
//! actually supplied, fingerprints it into a cache key and returns the cached
//! raw JSON while it is live. On a miss the REST API, the GraphQL endpoint or
//! the database is asked once and the raw response is stored with a TTL.
//!
//! GraphQL lookups are composed from a catalog of field whitelists, nested
//! fragments and query templates, optionally narrowed to the fields a caller
//! asks for.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sri_client::SriClient;
//!
//! #[tokio::main]
//! async fn main() -> sri_client::Result<()> {
//!     let client = SriClient::builder("https://sri.example.sk", "your-api-key")
//!         .build()
//!         .await?;
//!
//!     let nsz = client.get_nsz_by_id(42).await?;
//!     let found = client.search_organization(Some(3), None, Some("Institute")).await?;
//!     let activity = client.get_activity_detail("15", Some(&["name", "organization"])).await?;
//!     println!("{nsz}\n{found}\n{activity}");
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`SriClient`], its builder and the domain lookups |
//! | [`cache`] | Cache keys, backends and the read-through manager |
//! | [`params`] | Operation signatures and effective argument sets |
//! | [`graphql`] | Selection composer, query templates and the catalog |
//! | [`transport`] | Authenticated HTTP requests against the API |
//! | [`db`] | Named-bind SQL and query executors |
//! | [`config`] | Client and database configuration |

pub mod cache;
pub mod client;
pub mod config;
pub mod db;
pub mod graphql;
pub mod params;
pub mod transport;

pub use cache::{CacheBackend, CacheConfig, CacheKey, CacheManager, MemoryCache};
pub use client::{SriClient, SriClientBuilder};
pub use config::{ClientConfig, DatabaseConfig};
pub use db::{QueryExecutor, SqlParam};
pub use graphql::{GraphQlCatalog, GraphQlError};
pub use params::{ArgumentSet, ParameterExtractor};
pub use transport::TransportError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
