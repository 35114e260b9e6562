//! The SRI client and its domain lookups.
//!
//! [`SriClient`] ties the pieces together: it derives the effective arguments
//! of each lookup, fingerprints them into a cache key, and on a miss asks the
//! REST API, the GraphQL endpoint or the database.

mod activities;
mod builder;
mod core;
mod database;
mod nsz;
mod organizations;

pub use builder::SriClientBuilder;
pub use core::SriClient;

use crate::params::OperationSignature;

/// Declared parameters of the lookups that derive their arguments positionally.
pub const OPERATIONS: &[OperationSignature] = &[
    OperationSignature::new("search_organization", &["type_id", "group_id", "title"]),
    OperationSignature::new("get_organization_activities_by_focus", &["organization"]),
    OperationSignature::new("get_organization_activities_by_year", &["organization"]),
    OperationSignature::new(
        "get_organization_activities_by_sector_councils",
        &["organization"],
    ),
];
