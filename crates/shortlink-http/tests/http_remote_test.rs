// HTTP adapter tests against a mock shortlink service

use serde_json::json;
use shortlink_contracts::ShortenUrlRequest;
use shortlink_dispatch::{DispatchError, DispatcherConfig, RemoteError, RemoteOperations};
use shortlink_http::{connect, ClientConfig, HttpRemote, RemoteConfig};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote_for(server: &MockServer) -> HttpRemote {
    HttpRemote::new(&RemoteConfig::default().with_base_url(server.uri())).unwrap()
}

fn client_config(server: &MockServer) -> ClientConfig {
    ClientConfig::default()
        .with_remote(RemoteConfig::default().with_base_url(server.uri()))
        .with_dispatcher(DispatcherConfig::default().with_pool_size(2))
}

fn collection_body() -> serde_json::Value {
    json!({
        "id": "66f1c0ffee",
        "host": "www.google.com",
        "url": "/search",
        "params": { "q": "hello world" },
        "code": "abc123",
        "count": 0,
        "event_id": "evt-1",
        "created_at": "2024-09-23T10:15:00Z",
        "updated_at": "2024-09-23T10:15:00Z",
        "deleted_at": null
    })
}

#[tokio::test]
async fn test_health_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let status = remote_for(&server).check_health().await.unwrap();
    assert_eq!(status, "success");
}

#[tokio::test]
async fn test_health_unavailable_surfaces_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(503).set_body_string("database unreachable"))
        .mount(&server)
        .await;

    let err = remote_for(&server).check_health().await.unwrap_err();
    assert_eq!(
        err,
        RemoteError::Rejected {
            status: 503,
            body: "database unreachable".to_string()
        }
    );
    assert_eq!(err.to_string(), "database unreachable");
}

#[tokio::test]
async fn test_save_posts_json_and_parses_collection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/save"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "url": "https://www.google.com/search?q=hello+world",
            "event_id": "evt-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection_body()))
        .expect(1)
        .mount(&server)
        .await;

    let request =
        ShortenUrlRequest::new("https://www.google.com/search?q=hello+world").with_event_id("evt-1");
    let collection = remote_for(&server).shorten_url(&request).await.unwrap();

    assert_eq!(collection.code, "abc123");
    assert_eq!(collection.path, "/search");
    assert_eq!(collection.event_id.as_deref(), Some("evt-1"));
    assert!(collection.user_id.is_none());
    assert!(!collection.is_deleted());
    assert_eq!(
        collection.compose_url_string(),
        "https://www.google.com/search?q=hello+world"
    );
}

#[tokio::test]
async fn test_save_with_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/save"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = remote_for(&server)
        .shorten_url(&ShortenUrlRequest::new("https://a.com/x"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Decode(_)));
}

#[tokio::test]
async fn test_non_200_success_status_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/save"))
        .respond_with(ResponseTemplate::new(201).set_body_json(collection_body()))
        .mount(&server)
        .await;

    let err = remote_for(&server)
        .shorten_url(&ShortenUrlRequest::new("https://a.com/x"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Rejected { status: 201, .. }));
}

#[tokio::test]
async fn test_request_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let remote = HttpRemote::new(
        &RemoteConfig::default()
            .with_base_url(server.uri())
            .with_request_timeout(Duration::from_millis(50)),
    )
    .unwrap();

    let err = remote.check_health().await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)));
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Nothing listens on port 1
    let remote =
        HttpRemote::new(&RemoteConfig::default().with_base_url("http://127.0.0.1:1")).unwrap();
    let err = remote.check_health().await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)));
}

// =============================================================================
// Through the dispatcher
// =============================================================================

#[tokio::test]
async fn test_dispatcher_surfaces_quota_rejection_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/save"))
        .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let dispatcher = connect(client_config(&server)).unwrap();
    let err = dispatcher
        .shorten_url(ShortenUrlRequest::new("https://a.com/x"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "quota exceeded");
    assert!(matches!(
        err,
        DispatchError::Remote(RemoteError::Rejected { status: 403, .. })
    ));

    dispatcher.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_dispatcher_round_trip_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/save"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection_body()))
        .expect(5)
        .mount(&server)
        .await;

    let dispatcher = connect(client_config(&server)).unwrap();
    assert!(dispatcher.check_health().await.unwrap());

    let requests = (0..5).map(|i| {
        let dispatcher = dispatcher.clone();
        async move {
            dispatcher
                .shorten_url(ShortenUrlRequest::new(format!("https://a.com/{i}")))
                .await
        }
    });
    for result in futures::future::join_all(requests).await {
        assert_eq!(result.unwrap().code, "abc123");
    }

    assert_eq!(dispatcher.pending_results(), 0);
    dispatcher.shutdown().await.unwrap();
}
