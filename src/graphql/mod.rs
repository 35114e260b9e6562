//! GraphQL query composition.
//!
//! Queries are assembled from a [`GraphQlCatalog`]: for each entity a fixed
//! outer template, a whitelist of selectable fields and the nested fragments
//! some of those fields need. Callers may narrow the selection; anything
//! outside the whitelist is dropped silently.

mod catalog;
mod composer;

pub use catalog::{EntityQuery, GraphQlCatalog, TemplateParam};
pub use composer::{compose_selection, QueryTemplate, FIELDS_PLACEHOLDER};

use serde_json::Value;

/// A GraphQL response that carried a non-empty `errors` array.
///
/// The partial `data` of the response stays available.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("GraphQL errors: {}", summarize(.errors))]
pub struct GraphQlError {
    data: Value,
    errors: Vec<Value>,
}

fn summarize(errors: &[Value]) -> String {
    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|e| e.get("message").and_then(Value::as_str))
        .collect();
    if messages.is_empty() {
        format!("{} error(s)", errors.len())
    } else {
        messages.join("; ")
    }
}

impl GraphQlError {
    pub fn new(data: Value, errors: Vec<Value>) -> Self {
        Self { data, errors }
    }

    /// `Some` when `response` has a non-empty top-level `errors` array.
    pub fn from_response(response: &Value) -> Option<Self> {
        let errors = response.get("errors")?.as_array()?;
        if errors.is_empty() {
            return None;
        }
        Some(Self {
            data: response.get("data").cloned().unwrap_or(Value::Null),
            errors: errors.clone(),
        })
    }

    /// The response's `data` member, `null` when absent.
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn graphql_errors(&self) -> &[Value] {
        &self.errors
    }
}
