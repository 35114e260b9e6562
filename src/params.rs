//! Effective argument sets for lookup operations.
//!
//! Each operation declares its parameter names once, in order, as an
//! [`OperationSignature`]. [`ParameterExtractor::bind`] matches the values a
//! caller supplied against those names and drops the empty ones. The result,
//! an [`ArgumentSet`], drives both the cache key and the request query string.

use crate::cache::fingerprint;
use crate::{Error, ErrorContext, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Position -> effective parameter name.
pub type ParameterMap = BTreeMap<usize, String>;

/// Ordered parameter list of one operation.
///
/// An underscore in a declared name stands for a dot in the effective name,
/// so `type_id` binds as `type.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSignature {
    pub operation: &'static str,
    pub params: &'static [&'static str],
}

impl OperationSignature {
    pub const fn new(operation: &'static str, params: &'static [&'static str]) -> Self {
        Self { operation, params }
    }
}

/// Mirrors the API's notion of "not supplied": null, false, zero, `""`,
/// `"0"` and empty collections.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Name -> value map, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArgumentSet(BTreeMap<String, Value>);

impl ArgumentSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Insert unless the value counts as empty.
    pub fn insert_non_empty(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        if !is_empty_value(&value) {
            self.0.insert(name.into(), value);
        }
    }

    /// Move the value under `from` to `to`, if present.
    pub fn rename(&mut self, from: &str, to: impl Into<String>) {
        if let Some(value) = self.0.remove(from) {
            self.0.insert(to.into(), value);
        }
    }

    /// Add entries from `other` whose names are not present yet.
    pub fn merge_missing(&mut self, other: &ArgumentSet) {
        for (k, v) in &other.0 {
            self.0.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }

    /// Flatten into query-string pairs. Arrays become `name[]`, objects
    /// `name[key]`, nulls are skipped.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.0.len());
        for (name, value) in &self.0 {
            push_query_pair(name.clone(), value, &mut out);
        }
        out
    }
}

impl From<serde_json::Map<String, Value>> for ArgumentSet {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map.into_iter().collect())
    }
}

fn push_query_pair(name: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((name, b.to_string())),
        Value::Number(n) => out.push((name, n.to_string())),
        Value::String(s) => out.push((name, s.clone())),
        Value::Array(items) => {
            for item in items {
                push_query_pair(format!("{}[]", name), item, out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                push_query_pair(format!("{}[{}]", name, k), v, out);
            }
        }
    }
}

/// Resolves operation signatures into position -> name maps and binds
/// call-time values against them.
///
/// Resolved maps are memoized under a digest of the operation identifier.
pub struct ParameterExtractor {
    signatures: HashMap<&'static str, &'static [&'static str]>,
    resolved: RwLock<HashMap<String, Arc<ParameterMap>>>,
}

impl ParameterExtractor {
    pub fn new() -> Self {
        Self {
            signatures: HashMap::new(),
            resolved: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_signatures(signatures: &[OperationSignature]) -> Self {
        let mut extractor = Self::new();
        for sig in signatures {
            extractor.register(*sig);
        }
        extractor
    }

    /// Register or replace an operation's signature.
    pub fn register(&mut self, signature: OperationSignature) {
        self.signatures
            .insert(signature.operation, signature.params);
        self.resolved
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&fingerprint(signature.operation));
    }

    pub fn is_registered(&self, operation: &str) -> bool {
        self.signatures.contains_key(operation)
    }

    pub fn extract(&self, operation: &str) -> Result<Arc<ParameterMap>> {
        let memo_key = fingerprint(operation);
        // The memo only ever grows with complete entries, so a poisoned lock is still usable.
        if let Some(map) = self
            .resolved
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&memo_key)
        {
            return Ok(map.clone());
        }

        let params = self.signatures.get(operation).ok_or_else(|| {
            Error::lookup_with_context(
                format!("no declared signature for operation '{}'", operation),
                ErrorContext::new()
                    .with_field_path(operation)
                    .with_source("parameter_extractor"),
            )
        })?;
        let map: ParameterMap = params
            .iter()
            .enumerate()
            .map(|(pos, name)| (pos, name.replace('_', ".")))
            .collect();
        let map = Arc::new(map);

        self.resolved
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(memo_key, map.clone());
        Ok(map)
    }

    /// Build the effective argument set for one call.
    ///
    /// `values` are positional; positions after the last `Some` count as not
    /// supplied. Empty values are dropped.
    pub fn bind(&self, operation: &str, values: &[Option<Value>]) -> Result<ArgumentSet> {
        let names = self.extract(operation)?;
        let supplied = values
            .iter()
            .rposition(Option::is_some)
            .map(|last| last + 1)
            .unwrap_or(0);
        if supplied > names.len() {
            return Err(Error::lookup_with_context(
                format!(
                    "operation '{}' declares {} parameters, got {}",
                    operation,
                    names.len(),
                    supplied
                ),
                ErrorContext::new()
                    .with_field_path(operation)
                    .with_source("parameter_extractor"),
            ));
        }

        let mut args = ArgumentSet::new();
        for (pos, value) in values.iter().take(supplied).enumerate() {
            if let (Some(name), Some(value)) = (names.get(&pos), value) {
                args.insert_non_empty(name.clone(), value.clone());
            }
        }
        Ok(args)
    }
}

impl Default for ParameterExtractor {
    fn default() -> Self {
        Self::new()
    }
}
