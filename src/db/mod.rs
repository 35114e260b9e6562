//! Relational query layer.
//!
//! SQL text uses named binds (`:name`). [`bind_named`] rewrites them to the
//! driver's positional form and orders the values to match; a
//! [`QueryExecutor`] runs the result and returns the row set as JSON text,
//! which is what the read-through cache stores.

#[cfg(feature = "postgres")]
pub mod postgres;

use crate::params::ArgumentSet;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

// Quoted literals and `::` casts are matched first so they are copied through untouched.
static BIND_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"'(?:[^']|'')*'|::|:(?P<name>[A-Za-z_][A-Za-z0-9_]*)").expect("valid bind pattern")
});

/// Typed bind value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
    Null,
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlParam::Null)
    }
}

impl From<&SqlParam> for Value {
    fn from(p: &SqlParam) -> Self {
        match p {
            SqlParam::Int(i) => Value::from(*i),
            SqlParam::Text(s) => Value::from(s.as_str()),
            SqlParam::Null => Value::Null,
        }
    }
}

/// SQL with positional (`$n`) binds and the values in bind order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundQuery {
    pub sql: String,
    pub binds: Vec<SqlParam>,
}

/// Rewrite `:name` binds to `$1..$n`. A name used twice reuses its position.
pub fn bind_named(sql: &str, params: &[(&str, SqlParam)]) -> Result<BoundQuery> {
    let mut order: Vec<String> = Vec::new();
    let mut missing: Option<String> = None;

    let rewritten = BIND_PATTERN.replace_all(sql, |caps: &Captures<'_>| {
        let Some(name) = caps.name("name") else {
            return caps[0].to_string();
        };
        let name = name.as_str();
        if !params.iter().any(|(n, _)| *n == name) {
            missing.get_or_insert_with(|| name.to_string());
            return caps[0].to_string();
        }
        let position = match order.iter().position(|n| n == name) {
            Some(idx) => idx + 1,
            None => {
                order.push(name.to_string());
                order.len()
            }
        };
        format!("${}", position)
    });

    if let Some(name) = missing {
        return Err(Error::lookup_with_context(
            format!("no value for bind parameter ':{}'", name),
            ErrorContext::new()
                .with_field_path(name)
                .with_source("sql_binder"),
        ));
    }

    let binds = order
        .iter()
        .filter_map(|name| params.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone()))
        .collect();

    Ok(BoundQuery {
        sql: rewritten.into_owned(),
        binds,
    })
}

/// Cache-key arguments for a parameterized query.
pub fn query_arguments(sql: &str, params: &[(&str, SqlParam)]) -> ArgumentSet {
    let mut args = ArgumentSet::new();
    args.insert("sql", sql);
    for (name, value) in params {
        args.insert(format!(":{}", name), Value::from(value));
    }
    args
}

/// Runs bound queries and returns the row set as a JSON array of objects.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn fetch_json(&self, query: &BoundQuery) -> Result<String>;
    fn name(&self) -> &'static str;
}
