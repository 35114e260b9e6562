//! Mock HTTP server setup for integration tests

#![allow(dead_code)]

use mockito::{Matcher, Mock, Server, ServerGuard};
use sri_client::SriClient;

pub const API_KEY: &str = "test-key";

/// Test fixture that owns a mock SRI API
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Client with default settings pointed at the mock server
    pub async fn client(&self) -> SriClient {
        SriClient::builder(&self.base_url, API_KEY)
            .build()
            .await
            .expect("client builds")
    }

    /// GET mock answering JSON, expected to be hit `hits` times
    pub async fn mock_get(&mut self, path: &str, body: &str, hits: usize) -> Mock {
        self.server
            .mock("GET", path)
            .match_header("x-api-key", API_KEY)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// GraphQL mock whose request body matches `pattern`
    pub async fn mock_graphql(&mut self, pattern: &str, body: &str, hits: usize) -> Mock {
        self.server
            .mock("POST", "/api/graphql")
            .match_header("x-api-key", API_KEY)
            .match_body(Matcher::Regex(pattern.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }
}
