use super::TransportError;
use crate::config::ClientConfig;
use crate::graphql::GraphQlError;
use crate::{Error, ErrorContext, Result};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;
use url::Url;

/// Path of the GraphQL endpoint, relative to the base URL.
pub const GRAPHQL_PATH: &str = "api/graphql";

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
    language: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.api_url)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` against the base URL. Leading slashes are ignored so
    /// every path stays under the base URL's own path.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| {
                Error::Transport(TransportError::Other(format!(
                    "cannot resolve '{}' against {}: {}",
                    path, self.base_url, e
                )))
            })
    }

    /// Perform one request and return the raw response body.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<String>,
    ) -> Result<String> {
        let url = self.url(path)?;
        debug!(method = method.as_str(), %url, "sri request");

        let mut request = match method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
        };

        request = request
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT_LANGUAGE, self.language.as_str())
            .header(API_KEY_HEADER, self.api_key.as_str());

        if let Some(params) = query {
            if !params.is_empty() {
                request = request.query(params);
            }
        }

        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(TransportError::Http)?;
        let status = response.status();
        // Error bodies are informational only; a failed read must not hide the status.
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), %url, "sri request failed");
            return Err(TransportError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            }
            .into());
        }

        let text = response.text().await.map_err(TransportError::Http)?;
        Ok(text)
    }

    pub async fn get(&self, path: &str, query: Option<&[(String, String)]>) -> Result<String> {
        self.request(Method::Get, path, query, None).await
    }

    /// Post a GraphQL query and return the decoded response.
    pub async fn graphql(&self, query: &str) -> Result<Value> {
        let (_, value) = self.execute_graphql(query).await?;
        Ok(value)
    }

    /// Post a GraphQL query, returning both the raw body and its decoded form.
    ///
    /// A non-empty top-level `errors` array fails the call with
    /// [`GraphQlError`], which keeps the partial `data`.
    pub(crate) async fn execute_graphql(&self, query: &str) -> Result<(String, Value)> {
        let envelope = serde_json::json!({ "query": query });
        let raw = self
            .request(
                Method::Post,
                GRAPHQL_PATH,
                None,
                Some(serde_json::to_string(&envelope)?),
            )
            .await?;
        let value: Value = serde_json::from_str(&raw)?;
        if let Some(err) = GraphQlError::from_response(&value) {
            debug!(errors = err.graphql_errors().len(), "graphql response carried errors");
            return Err(err.into());
        }
        Ok((raw, value))
    }
}

fn normalize_base_url(api_url: &str) -> Result<Url> {
    let normalized = format!("{}/", api_url.trim_end_matches('/'));
    Url::parse(&normalized).map_err(|e| {
        Error::configuration_with_context(
            "invalid API base URL",
            ErrorContext::new()
                .with_field_path("api_url")
                .with_details(format!("{} ({})", e, api_url))
                .with_source("http_transport"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(url: &str) -> HttpTransport {
        HttpTransport::new(&ClientConfig::new(url, "key")).unwrap()
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        assert_eq!(
            transport("https://sri.example/base").base_url().as_str(),
            "https://sri.example/base/"
        );
        assert_eq!(
            transport("https://sri.example/base///").base_url().as_str(),
            "https://sri.example/base/"
        );
    }

    #[test]
    fn test_paths_resolve_under_base() {
        let t = transport("https://sri.example/base");
        assert_eq!(
            t.url("/api/graphql").unwrap().as_str(),
            "https://sri.example/base/api/graphql"
        );
        assert_eq!(
            t.url("api/nszs/42.json").unwrap().as_str(),
            "https://sri.example/base/api/nszs/42.json"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpTransport::new(&ClientConfig::new("::nope", "key"))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
