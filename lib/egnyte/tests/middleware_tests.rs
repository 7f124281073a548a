//! Integration tests for the transport chain using wiremock.

use std::time::{Duration, Instant};

use assert2::let_assert;
use egnyte::{
    CancellationToken, Dispatcher, Error, HttpClient, HyperClient, Method, Request,
    middleware::LoggingLayer,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string, header, method, path},
};

const OVER_QPS_HEADER: &str = "X-Mashery-Error-Code";
const OVER_QPS_CODE: &str = "ERR_403_DEVELOPER_OVER_QPS";

fn over_qps(retry_after: &str) -> ResponseTemplate {
    ResponseTemplate::new(403)
        .insert_header(OVER_QPS_HEADER, OVER_QPS_CODE)
        .insert_header("Retry-After", retry_after)
        .set_body_string("<h1>Developer Over Qps</h1>")
}

fn url(server: &MockServer, path: &str) -> url::Url {
    url::Url::parse(&format!("{}{path}", server.uri())).expect("url")
}

/// Over-QPS rejections are retried until the quota clears.
#[tokio::test]
async fn test_over_qps_is_retried_until_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v1/userinfo"))
        .respond_with(over_qps("0"))
        .up_to_n_times(3)
        .expect(3)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v1/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HyperClient::new();
    let request = Request::builder(Method::Get, url(&mock_server, "/pubapi/v1/userinfo")).build();

    let response = client.execute(request).await.expect("response");

    assert_eq!(response.status(), 200);
}

/// Retried requests carry the identical body.
#[tokio::test]
async fn test_over_qps_retry_resends_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pubapi/v1/fs/Shared/new"))
        .and(body_string(r#"{"action":"add_folder"}"#))
        .respond_with(over_qps("0"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/pubapi/v1/fs/Shared/new"))
        .and(body_string(r#"{"action":"add_folder"}"#))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HyperClient::new();
    let request = Request::builder(Method::Post, url(&mock_server, "/pubapi/v1/fs/Shared/new"))
        .json(&serde_json::json!({"action": "add_folder"}))
        .expect("json")
        .build();

    let response = client.execute(request).await.expect("response");

    assert_eq!(response.status(), 201);
}

/// A 403 without the over-QPS code is handed back after one send.
#[tokio::test]
async fn test_plain_forbidden_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v1/fs/Private"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_raw(r#"{"errorMessage":"Access denied"}"#, "application/json"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = Dispatcher::new(HyperClient::new());
    let request = Request::builder(Method::Get, url(&mock_server, "/pubapi/v1/fs/Private")).build();

    let result = dispatcher
        .send_bytes(request, &CancellationToken::new())
        .await;

    let_assert!(Err(err) = result);
    assert_eq!(err.status(), Some(403));
    assert_eq!(err.message(), Some("Access denied"));
}

/// The attempt cap returns the last rejection as an API error.
#[tokio::test]
async fn test_max_rate_limit_attempts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v1/userinfo"))
        .respond_with(over_qps("0"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().with_max_rate_limit_attempts(2).build();
    let dispatcher = Dispatcher::new(client);
    let request = Request::builder(Method::Get, url(&mock_server, "/pubapi/v1/userinfo")).build();

    let result = dispatcher
        .send_bytes(request, &CancellationToken::new())
        .await;

    let_assert!(Err(err) = result);
    assert_eq!(err.status(), Some(403));
    assert_eq!(err.message(), Some("<h1>Developer Over Qps</h1>"));
}

/// Without the retry layer over-QPS rejections surface immediately.
#[tokio::test]
async fn test_without_over_qps_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v1/userinfo"))
        .respond_with(over_qps("0"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder().without_over_qps_retry().build();
    let request = Request::builder(Method::Get, url(&mock_server, "/pubapi/v1/userinfo")).build();

    let response = client.execute(request).await.expect("response");

    assert_eq!(response.status(), 403);
}

/// Cancelling during the over-QPS wait stops the retry loop.
#[tokio::test]
async fn test_cancel_during_over_qps_wait() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v1/userinfo"))
        .respond_with(over_qps("30"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dispatcher = Dispatcher::new(HyperClient::new());
    let cancel = CancellationToken::new();
    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        })
    };

    let start = Instant::now();
    let request = Request::builder(Method::Get, url(&mock_server, "/pubapi/v1/userinfo")).build();
    let result = dispatcher.send_bytes(request, &cancel).await;

    let_assert!(Err(Error::Cancelled) = result);
    assert!(start.elapsed() < Duration::from_secs(5));
    canceller.await.expect("canceller");
}

/// Cancelling while the server is slow abandons the call.
#[tokio::test]
async fn test_cancel_in_flight_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v1/fs-content/big.iso"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .mount(&mock_server)
        .await;

    let dispatcher = Dispatcher::new(HyperClient::new());
    let cancel = CancellationToken::new();
    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        })
    };

    let start = Instant::now();
    let request = Request::builder(
        Method::Get,
        url(&mock_server, "/pubapi/v1/fs-content/big.iso"),
    )
    .build();
    let result = dispatcher.send_stream(request, &cancel).await;

    let_assert!(Err(Error::Cancelled) = result);
    assert!(start.elapsed() < Duration::from_secs(5));
    canceller.await.expect("canceller");
}

/// Bearer auth and logging compose with the default retry layer.
#[tokio::test]
async fn test_middleware_composition() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v1/userinfo"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(over_qps("0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pubapi/v1/userinfo"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HyperClient::builder()
        .with_bearer_auth("test-token")
        .with_debug_logging()
        .layer(LoggingLayer::new())
        .build();
    let request = Request::builder(Method::Get, url(&mock_server, "/pubapi/v1/userinfo")).build();

    let response = client.execute(request).await.expect("response");

    assert_eq!(response.status(), 200);
}

/// A default `User-Agent` is sent unless the request sets one.
#[tokio::test]
async fn test_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/default"))
        .and(header("User-Agent", egnyte::DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/custom"))
        .and(header("User-Agent", "backup-agent/2.1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HyperClient::new();

    let request = Request::builder(Method::Get, url(&mock_server, "/default")).build();
    assert_eq!(client.execute(request).await.expect("response").status(), 200);

    let request = Request::builder(Method::Get, url(&mock_server, "/custom"))
        .header("User-Agent", "backup-agent/2.1")
        .build();
    assert_eq!(client.execute(request).await.expect("response").status(), 200);
}

/// A `204 No Content` decodes as `()`.
#[tokio::test]
async fn test_no_content_decodes_as_unit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/pubapi/v1/fs/Shared/old.txt"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let dispatcher = Dispatcher::new(HyperClient::new());
    let request = Request::builder(
        Method::Delete,
        url(&mock_server, "/pubapi/v1/fs/Shared/old.txt"),
    )
    .build();

    let envelope = dispatcher
        .send_json::<()>(request, &CancellationToken::new())
        .await
        .expect("no content");

    assert_eq!(envelope.status(), 204);
}
