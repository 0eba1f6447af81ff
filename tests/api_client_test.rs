mod common;

use std::time::Duration;

use apirelay::domain::models::{Credentials, Outcome, RateLimitConfig};
use apirelay::infrastructure::http::{ApiClient, ApiClientError, ClearResult};
use common::{api_client, api_config};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_get_is_cached_until_cleared() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(header("authorization", "Bearer secret"))
        .and(header("user-agent", "apirelay-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(2)
        .mount(&server)
        .await;

    let client = api_client(&server.uri(), Credentials::bearer("secret"));

    let first = client.request("GET", "/users", None, true).await.unwrap();
    assert!(first.is_success());
    assert!(!first.is_cached());

    let second = client.request("GET", "/users", None, true).await.unwrap();
    let Outcome::Success(second) = second else {
        panic!("expected success");
    };
    assert!(second.cached);
    assert_eq!(second.status, 200);
    assert_eq!(second.data, json!([{"id": 1}]));

    assert_eq!(client.clear_cache(Some("/users")), ClearResult::Removed(1));
    let third = client.request("GET", "/users", None, true).await.unwrap();
    assert!(!third.is_cached());
}

#[tokio::test]
async fn test_cache_bypass_and_writes_always_dispatch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(body_json(json!({"name": "widget"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9})))
        .expect(2)
        .mount(&server)
        .await;

    let client = api_client(&server.uri(), Credentials::api_key("k"));
    let payload = json!({"name": "widget"});

    for _ in 0..2 {
        assert!(!client.request("GET", "/items", None, false).await.unwrap().is_cached());
        let created = client
            .request("POST", "/items", Some(&payload), true)
            .await
            .unwrap();
        assert_eq!(created.status(), 201);
        assert!(!created.is_cached());
    }
}

#[tokio::test]
async fn test_get_payload_becomes_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust"))
        .and(query_param("page", "2"))
        .and(header("x-api-key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server.uri(), Credentials::api_key("k"));
    let outcome = client
        .request("get", "/search", Some(&json!({"q": "rust", "page": 2})), true)
        .await
        .unwrap();
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_rate_limit_rejects_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = api_config(&server.uri(), Credentials::bearer("t"));
    config.rate_limit = RateLimitConfig {
        points: 2,
        duration_secs: 60,
        block_duration_secs: 30,
    };
    let client = ApiClient::new(config).unwrap();

    assert!(client.request("GET", "/a", None, false).await.unwrap().is_success());
    assert!(client.request("GET", "/a", None, false).await.unwrap().is_success());

    let Outcome::Failure(limited) = client.request("GET", "/a", None, false).await.unwrap() else {
        panic!("expected rate limit failure");
    };
    assert_eq!(limited.status, 429);
    assert_eq!(limited.retry_after, Some(30));
    assert_eq!(limited.remaining_points, Some(0));
    assert_eq!(limited.message, "Rate limit exceeded. Retry after 30 seconds");

    // Budgets are per endpoint
    assert_eq!(client.rate_limit_status("/b").remaining_points, 2);
    assert_eq!(client.rate_limit_status("/a").remaining_points, 0);
}

#[tokio::test]
async fn test_upstream_error_becomes_failure_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "no such thing"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = api_client(&server.uri(), Credentials::bearer("t"));

    let Outcome::Failure(missing) = client.request("GET", "/missing", None, true).await.unwrap()
    else {
        panic!("expected failure");
    };
    assert_eq!(missing.status, 404);
    assert_eq!(missing.message, "API call failed: 404 Not Found");
    assert_eq!(missing.error, json!({"error": "no such thing"}));

    let Outcome::Failure(plain) = client.request("GET", "/plain", None, true).await.unwrap() else {
        panic!("expected failure");
    };
    assert_eq!(plain.error, json!("bad gateway"));

    // Failures are never cached
    assert!(!client.request("GET", "/missing", None, true).await.unwrap().is_cached());
}

#[tokio::test]
async fn test_oauth2_refreshes_once_on_401_and_replays() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_json(json!({
            "grant_type": "client_credentials",
            "client_id": "id",
            "client_secret": "secret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "stale"})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let token_url = format!("{}/oauth/token", server.uri());
    let client = api_client(&server.uri(), Credentials::oauth2("id", "secret", token_url));

    let outcome = client.request("GET", "/data", None, false).await.unwrap();
    let Outcome::Success(ok) = outcome else {
        panic!("expected success after refresh");
    };
    assert_eq!(ok.data, json!({"value": 42}));
}

#[tokio::test]
async fn test_oauth2_second_401_is_returned_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "revoked"})))
        .expect(2)
        .mount(&server)
        .await;

    let token_url = format!("{}/oauth/token", server.uri());
    let client = api_client(&server.uri(), Credentials::oauth2("id", "secret", token_url));

    let outcome = client.request("GET", "/data", None, false).await.unwrap();
    assert_eq!(outcome.status(), 401);
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn test_bearer_401_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server.uri(), Credentials::bearer("t"));
    let outcome = client.request("GET", "/data", None, false).await.unwrap();
    assert_eq!(outcome.status(), 401);
}

#[tokio::test]
async fn test_configuration_and_transport_errors() {
    let client = api_client("http://127.0.0.1:1", Credentials::Bearer { token: None });
    assert!(matches!(
        client.request("GET", "/x", None, false).await.unwrap_err(),
        ApiClientError::AuthConfiguration(_)
    ));

    let client = api_client("http://127.0.0.1:1", Credentials::bearer("t"));
    let err = client.request("GET", "/x", None, false).await.unwrap_err();
    assert!(matches!(err, ApiClientError::Transport(_)));
    assert!(err.is_connect());

    assert!(matches!(
        client.request("FETCH", "/x", None, false).await.unwrap_err(),
        ApiClientError::InvalidMethod(_)
    ));
}

#[tokio::test]
async fn test_cache_entries_expire() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"n": 1})))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = api_config(&server.uri(), Credentials::bearer("t"));
    config.cache_ttl = Duration::from_millis(50);
    let client = ApiClient::new(config).unwrap();

    assert!(!client.request("GET", "/n", None, true).await.unwrap().is_cached());
    assert!(client.request("GET", "/n", None, true).await.unwrap().is_cached());
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(!client.request("GET", "/n", None, true).await.unwrap().is_cached());
}
