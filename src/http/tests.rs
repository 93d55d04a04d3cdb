//! Tests for the HTTP transport

use super::*;
use crate::auth::{AuthConfig, Authenticator, CachedToken, TokenProvider};
use crate::config::{AuthSettings, ConnectionConfig};
use crate::error::{Error, Result};
use crate::types::{BackoffType, MediaType};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::default().max_attempts(max_attempts).backoff(
        BackoffType::Constant,
        Duration::from_millis(10),
        Duration::from_secs(1),
    )
}

fn basic_transporter(max_attempts: u32) -> Transporter {
    let connection = ConnectionConfig {
        base_url: String::new(),
        auth: AuthSettings::basic("admin", "secret"),
        proxy: None,
        timeout_seconds: 30,
    };
    Transporter::new(&connection, fast_policy(max_attempts)).unwrap()
}

fn url(server: &MockServer, p: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
}

struct CountingProvider {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TokenProvider for CountingProvider {
    async fn fetch_token(&self) -> Result<CachedToken> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CachedToken::new(format!("token-{n}"), None))
    }
}

// ============================================================================
// Single fetch
// ============================================================================

#[tokio::test]
async fn test_fetch_buffers_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/odata/Benefit/$count"))
        .and(header("Accept", "text/plain"))
        .and(header("Authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("dataserviceversion", "2.0")
                .set_body_string("378403"),
        )
        .mount(&mock_server)
        .await;

    let transporter = basic_transporter(5);
    let response = transporter
        .fetch(&url(&mock_server, "/odata/Benefit/$count"), MediaType::Text)
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.status_message(), "OK");
    assert_eq!(response.service_version(), Some("2.0"));
    assert_eq!(response.body_text(), "378403");
    assert!(response.is_success());
}

#[tokio::test]
async fn test_fetch_does_not_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/odata/$metadata"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transporter = basic_transporter(5);
    let response = transporter
        .fetch(&url(&mock_server, "/odata/$metadata"), MediaType::Xml)
        .await
        .unwrap();

    assert_eq!(response.status(), 503);
}

// ============================================================================
// Retrying fetch
// ============================================================================

#[tokio::test]
async fn test_fetch_with_retry_recovers() {
    let mock_server = MockServer::start().await;

    // First two calls return 500, third succeeds
    Mock::given(method("GET"))
        .and(path("/odata/Benefit"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/odata/Benefit"))
        .and(header("Accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"d": {"results": []}})),
        )
        .mount(&mock_server)
        .await;

    let transporter = basic_transporter(5);
    let response = transporter
        .fetch_with_retry(&url(&mock_server, "/odata/Benefit"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_fetch_with_retry_gives_up_after_max_attempts() {
    for status in [500u16, 502, 503] {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/odata/Benefit"))
            .respond_with(ResponseTemplate::new(status).set_body_string("busy"))
            .expect(5)
            .mount(&mock_server)
            .await;

        let transporter = basic_transporter(5);
        let err = transporter
            .fetch_with_retry(&url(&mock_server, "/odata/Benefit"))
            .await
            .unwrap_err();

        match err {
            Error::RetriesExhausted {
                attempts, message, ..
            } => {
                assert_eq!(attempts, 5);
                assert!(message.contains(&status.to_string()));
                assert!(message.contains("busy"));
            }
            other => panic!("Expected RetriesExhausted, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_fetch_with_retry_returns_client_errors_unchanged() {
    for status in [400u16, 401, 404] {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/odata/Benefit"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transporter = basic_transporter(5);
        let response = transporter
            .fetch_with_retry(&url(&mock_server, "/odata/Benefit"))
            .await
            .unwrap();

        assert_eq!(response.status(), status);
        assert_eq!(response.body_text(), "nope");
    }
}

#[tokio::test]
async fn test_fetch_with_retry_connection_refused() {
    let transporter = basic_transporter(3);
    let target = Url::parse("http://127.0.0.1:1/odata/Benefit").unwrap();

    let err = transporter.fetch_with_retry(&target).await.unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
}

// ============================================================================
// Bearer refresh
// ============================================================================

#[tokio::test]
async fn test_bearer_403_refreshes_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/odata/Benefit"))
        .and(header("Authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/odata/Benefit"))
        .and(header("Authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let auth = Authenticator::new(AuthConfig::bearer(CountingProvider {
        calls: Arc::clone(&calls),
    }));
    let transporter = Transporter::with_client(reqwest::Client::new(), auth, fast_policy(5));

    let response = transporter
        .fetch(&url(&mock_server, "/odata/Benefit"), MediaType::Json)
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_bearer_second_403_is_surfaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/odata/Benefit"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthConfig::bearer(CountingProvider {
        calls: Arc::new(AtomicUsize::new(0)),
    }));
    let transporter = Transporter::with_client(reqwest::Client::new(), auth, fast_policy(5));

    let response = transporter
        .fetch_with_retry(&url(&mock_server, "/odata/Benefit"))
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_basic_403_is_not_repeated() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/odata/Benefit"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = basic_transporter(5)
        .fetch(&url(&mock_server, "/odata/Benefit"), MediaType::Json)
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
}

// ============================================================================
// Retry policy
// ============================================================================

#[test]
fn test_delay_constant() {
    let policy = RetryPolicy::default().backoff(
        BackoffType::Constant,
        Duration::from_millis(100),
        Duration::from_secs(10),
    );
    assert_eq!(policy.delay_for(1), Duration::from_millis(100));
    assert_eq!(policy.delay_for(4), Duration::from_millis(100));
}

#[test]
fn test_delay_linear() {
    let policy = RetryPolicy::default().backoff(
        BackoffType::Linear,
        Duration::from_millis(100),
        Duration::from_secs(10),
    );
    assert_eq!(policy.delay_for(1), Duration::from_millis(100));
    assert_eq!(policy.delay_for(2), Duration::from_millis(200));
    assert_eq!(policy.delay_for(3), Duration::from_millis(300));
}

#[test]
fn test_delay_exponential_is_capped() {
    let policy = RetryPolicy::default().backoff(
        BackoffType::Exponential,
        Duration::from_secs(1),
        Duration::from_secs(5),
    );
    assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    assert_eq!(policy.delay_for(2), Duration::from_secs(2));
    assert_eq!(policy.delay_for(3), Duration::from_secs(4));
    assert_eq!(policy.delay_for(4), Duration::from_secs(5));
    assert_eq!(policy.delay_for(40), Duration::from_secs(5));
}

#[test]
fn test_should_retry_predicate() {
    let policy = RetryPolicy::default();
    let response = |status| Ok(ResponseContainer::new(status, "", None, Vec::new()));

    assert!(policy.should_retry(&response(500)));
    assert!(policy.should_retry(&response(503)));
    assert!(!policy.should_retry(&response(200)));
    assert!(!policy.should_retry(&response(404)));
    assert!(!policy.should_retry(&Err(Error::schema("x"))));
}

#[test]
fn test_default_policy_allows_five_attempts() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 5);
    assert!(policy.has_attempts_left(4));
    assert!(!policy.has_attempts_left(5));
    assert_eq!(RetryPolicy::no_retry().max_attempts, 1);
}
