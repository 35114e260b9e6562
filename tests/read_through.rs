//! Read-through caching of NSZ lookups against a mock API

mod common;

use common::{MockServerFixture, API_KEY};
use mockito::Matcher;
use serde_json::json;
use sri_client::{ArgumentSet, SriClient};
use std::time::Duration;

#[tokio::test]
async fn test_nsz_by_id_is_fetched_once() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", "/api/nszs/42.json")
        .match_header("x-api-key", API_KEY)
        .match_header("accept-language", "sk_SK")
        .match_header("accept", "application/json")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_body(r#"{"id":42,"title":"Zvárač"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = fixture.client().await;
    let first = client.get_nsz_by_id(42).await.unwrap();
    let second = client.get_nsz_by_id(42).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first["title"], "Zvárač");
    mock.assert_async().await;
    assert_eq!(client.cache().stats().hits, 1);
    assert_eq!(client.cache().stats().misses, 1);
}

#[tokio::test]
async fn test_entry_is_refetched_after_expiry() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture.mock_get("/api/nszs/7.json", r#"{"id":7}"#, 2).await;

    let client = SriClient::builder(&fixture.base_url, API_KEY)
        .nsz_cache_ttl(Duration::from_secs(1))
        .build()
        .await
        .unwrap();

    client.get_nsz_by_id(7).await.unwrap();
    client.get_nsz_by_id(7).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;
    client.get_nsz_by_id(7).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_language_header_follows_configuration() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", "/api/nszs/1.json")
        .match_header("accept-language", "en_US")
        .with_body("{}")
        .create_async()
        .await;

    let client = SriClient::builder(&fixture.base_url, API_KEY)
        .language("en_US")
        .build()
        .await
        .unwrap();
    client.get_nsz_by_id(1).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_nsz_list_query_and_body() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", "/api/nszs.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("pagination".into(), "false".into()),
            Matcher::UrlEncoded("sectorCouncil".into(), "12".into()),
        ]))
        .match_body(Matcher::Json(json!({"title": "kuchár"})))
        .with_body(r#"[{"id":1},{"id":2}]"#)
        .expect(1)
        .create_async()
        .await;

    let client = fixture.client().await;
    let query = ArgumentSet::from_pairs([("sectorCouncil", 12)]);
    let body = ArgumentSet::from_pairs([("title", "kuchár")]);

    let list = client.get_nsz_list(&query, &body).await.unwrap();
    assert_eq!(list.as_array().map(Vec::len), Some(2));
    client.get_nsz_list(&query, &body).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_nsz_list_bodies_are_keyed_apart_from_query() {
    let mut fixture = MockServerFixture::new().await;
    let mut mocks = Vec::new();
    for title in ["welder", "cook"] {
        let mock = fixture
            .server
            .mock("GET", "/api/nszs.json")
            .match_query(Matcher::UrlEncoded("title".into(), "x".into()))
            .match_body(Matcher::Json(json!({ "title": title })))
            .with_body(json!([title]).to_string())
            .expect(1)
            .create_async()
            .await;
        mocks.push(mock);
    }

    let client = fixture.client().await;
    let query = ArgumentSet::from_pairs([("title", "x")]);
    let welders = client
        .get_nsz_list(&query, &ArgumentSet::from_pairs([("title", "welder")]))
        .await
        .unwrap();
    let cooks = client
        .get_nsz_list(&query, &ArgumentSet::from_pairs([("title", "cook")]))
        .await
        .unwrap();

    assert_eq!(welders, json!(["welder"]));
    assert_eq!(cooks, json!(["cook"]));
    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn test_nsz_list_caller_can_enable_pagination() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("GET", "/api/nszs.json")
        .match_query(Matcher::UrlEncoded("pagination".into(), "true".into()))
        .with_body("[]")
        .create_async()
        .await;

    let client = fixture.client().await;
    let query = ArgumentSet::from_pairs([("pagination", true)]);
    client.get_nsz_list(&query, &ArgumentSet::new()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_nsz_iscos_field_projection_shares_one_request() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_get(
            "/api/nsz_iscos.json",
            r#"[{"code":"7212","title":"Welders"},{"title":"No code"},{"code":"5120","title":"Cooks"}]"#,
            1,
        )
        .await;

    let client = fixture.client().await;
    let all = client.get_nsz_iscos(None).await.unwrap();
    let codes = client.get_nsz_iscos(Some("code")).await.unwrap();

    assert_eq!(all.as_array().map(Vec::len), Some(3));
    assert_eq!(codes, json!(["7212", "5120"]));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_undecodable_response_is_not_cached() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture.mock_get("/api/nszs/3.json", "<html>oops</html>", 2).await;

    let client = fixture.client().await;
    for _ in 0..2 {
        let err = client.get_nsz_by_id(3).await.unwrap_err();
        assert!(matches!(err, sri_client::Error::Decode(_)));
    }
    mock.assert_async().await;
}
