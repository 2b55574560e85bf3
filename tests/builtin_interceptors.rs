// End-to-end tests for the configured chain: built-in interceptors, retries
// and the response transformer slot
mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{MockClient, Probe, body_of, entries, new_log};
use http::{HeaderValue, Method, StatusCode};
use http_interceptor::{
    HttpClientError, HttpDirect, HttpResponse, InterceptorError, InterceptorRequest,
    InterceptorResult, InterceptorService, RequestOptions, ResponseTransformer, TransportCall,
    adapters::{
        RetryTransformer, build_interceptor_service,
        interceptors::{REQUEST_ID_KEY, STUB_PREFIX_KEY},
    },
    config::models::{ClientConfig, RetryConfig, StubConfig},
};

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        base_delay_ms: 1,
        max_delay_ms: 5,
        retry_on_status: vec![503],
    }
}

#[tokio::test]
async fn test_configured_chain_decorates_outgoing_request() {
    let client = MockClient::ok("hello");
    let config = ClientConfig::builder()
        .header("x-api-key", "secret")
        .build();
    let service = build_interceptor_service(&config, client.clone()).unwrap();

    let response = service.get("http://svc/greeting", None).await.unwrap().unwrap();
    assert_eq!(body_of(&response), "hello");

    let sent = client.last_request().unwrap();
    assert_eq!(sent.headers()["x-api-key"], "secret");
    let request_id = sent.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(request_id).is_ok());
}

#[tokio::test]
async fn test_stub_answers_without_network() {
    let client = MockClient::ok("network");
    let config = ClientConfig::builder()
        .stub(
            "http://svc/health",
            StubConfig {
                status: 200,
                body: r#"{"status":"ok"}"#.to_string(),
                content_type: Some("application/json".to_string()),
            },
        )
        .build();
    let service = build_interceptor_service(&config, client.clone()).unwrap();

    let stubbed = service.get("http://svc/health/live", None).await.unwrap().unwrap();
    assert_eq!(client.calls(), 0);
    assert_eq!(body_of(&stubbed), r#"{"status":"ok"}"#);
    assert_eq!(stubbed.headers()["content-type"], "application/json");

    let live = service.get("http://svc/other", None).await.unwrap().unwrap();
    assert_eq!(client.calls(), 1);
    assert_eq!(body_of(&live), "network");
}

#[tokio::test]
async fn test_stubbed_error_status_fails_when_configured() {
    let config = ClientConfig::builder()
        .fail_on_error_status(true)
        .stub(
            "http://svc/missing",
            StubConfig {
                status: 404,
                body: String::new(),
                content_type: None,
            },
        )
        .build();
    let service = build_interceptor_service(&config, MockClient::ok("unused")).unwrap();

    let err = service.get("http://svc/missing", None).await.unwrap_err();
    assert!(matches!(
        err.as_transport(),
        Some(HttpClientError::BackendError { status, .. }) if *status == StatusCode::NOT_FOUND
    ));
}

#[tokio::test]
async fn test_caller_shared_data_sees_builtin_bookkeeping() {
    let config = ClientConfig::builder()
        .stub(
            "http://svc/",
            StubConfig {
                status: 204,
                body: String::new(),
                content_type: None,
            },
        )
        .build();
    let service = build_interceptor_service(&config, MockClient::ok("unused")).unwrap();

    let shared = http_interceptor::SharedData::new();
    let options = RequestOptions::new().with_shared_data(shared.clone());
    let response = service.get("http://svc/ping", Some(options)).await.unwrap().unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(shared.get::<String>(REQUEST_ID_KEY).await.is_some());
    assert_eq!(
        shared.get::<String>(STUB_PREFIX_KEY).await.as_deref(),
        Some("http://svc/")
    );
}

#[tokio::test]
async fn test_retry_recovers_from_connection_errors() {
    let client = MockClient::flaky(2);
    let service = InterceptorService::new(client.clone())
        .with_response_transformer(Arc::new(RetryTransformer::new(&fast_retry(3))));

    let response = service.get("http://svc/", None).await.unwrap().unwrap();

    assert_eq!(client.calls(), 3);
    assert_eq!(body_of(&response), "recovered by retry");
}

#[tokio::test]
async fn test_retry_gives_up_and_hands_error_to_chain() {
    let log = new_log();
    let client = MockClient::failing();
    let service = InterceptorService::new(client.clone())
        .with_interceptor(Probe::new("A", &log).arc())
        .with_response_transformer(Arc::new(RetryTransformer::new(&fast_retry(2))));

    let err = service.get("http://svc/", None).await.unwrap_err();

    assert_eq!(client.calls(), 3);
    assert!(matches!(
        err.as_transport(),
        Some(HttpClientError::ConnectionError(_))
    ));
    assert_eq!(entries(&log), vec!["A:before@0", "A:on_err@0"]);
}

#[tokio::test]
async fn test_retry_skips_non_idempotent_methods() {
    let client = MockClient::flaky(1);
    let service = InterceptorService::new(client.clone())
        .with_response_transformer(Arc::new(RetryTransformer::new(&fast_retry(3))));

    let err = service.post("http://svc/orders", "{}", None).await.unwrap_err();

    assert_eq!(client.calls(), 1);
    assert!(err.as_transport().is_some());
}

#[tokio::test]
async fn test_retry_on_configured_status() {
    let client = MockClient::with_status(StatusCode::SERVICE_UNAVAILABLE);
    let service = InterceptorService::new(client.clone())
        .with_response_transformer(Arc::new(RetryTransformer::new(&fast_retry(2))));

    // Still unavailable after the retries: the last response is delivered
    let response = service.get("http://svc/", None).await.unwrap().unwrap();
    assert_eq!(client.calls(), 3);
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

/// Transformer that fetches a token through the direct facade before sending
/// the real call with it.
struct TokenRefresh;

#[async_trait]
impl ResponseTransformer for TokenRefresh {
    async fn transform(
        &self,
        call: TransportCall,
        request: &InterceptorRequest,
        http: &HttpDirect,
        _service: &InterceptorService,
    ) -> InterceptorResult<HttpResponse> {
        http.post("http://auth/token", "refresh", None).await?;
        assert_eq!(call.options().method, Method::GET);
        assert_eq!(call.url(), request.url());
        Ok(call.send().await?)
    }
}

#[tokio::test]
async fn test_transformer_side_calls_bypass_the_chain() {
    let log = new_log();
    let client = MockClient::ok("data");
    let service = InterceptorService::new(client.clone())
        .with_interceptor(Probe::new("A", &log).arc())
        .with_response_transformer(Arc::new(TokenRefresh));

    let response = service.get("http://svc/data", None).await.unwrap().unwrap();

    assert_eq!(body_of(&response), "data");
    assert_eq!(client.calls(), 2);
    // The token call never went through A
    assert_eq!(entries(&log), vec!["A:before@0", "A:on_response@0"]);
}

/// Transformer that issues an intercepted call of its own via the service handle.
struct Probing;

#[async_trait]
impl ResponseTransformer for Probing {
    async fn transform(
        &self,
        call: TransportCall,
        request: &InterceptorRequest,
        _http: &HttpDirect,
        service: &InterceptorService,
    ) -> InterceptorResult<HttpResponse> {
        if request.url().ends_with("/probe") {
            return Ok(call.send().await?);
        }
        service
            .get("http://svc/probe", None)
            .await?
            .ok_or(InterceptorError::EmptyResponse)?;
        Ok(call.send().await?)
    }
}

#[tokio::test]
async fn test_transformer_can_reenter_through_the_service() {
    let log = new_log();
    let client = MockClient::ok("data");
    let service = InterceptorService::new(client.clone())
        .with_interceptor(Probe::new("A", &log).arc())
        .with_response_transformer(Arc::new(Probing));

    service.get("http://svc/data", None).await.unwrap().unwrap();

    assert_eq!(client.calls(), 2);
    assert_eq!(
        entries(&log),
        vec!["A:before@0", "A:before@0", "A:on_response@0", "A:on_response@0"]
    );
}

#[tokio::test]
async fn test_verb_helpers_keep_caller_body() {
    let client = MockClient::ok("ok");
    let service = InterceptorService::new(client.clone());

    service
        .put(
            "http://svc/item",
            "default",
            Some(
                RequestOptions::new()
                    .with_body("explicit")
                    .with_header("content-type", HeaderValue::from_static("text/plain")),
            ),
        )
        .await
        .unwrap();

    let sent = client.last_request().unwrap();
    assert_eq!(*sent.method(), Method::PUT);
    assert_eq!(sent.body().as_ref(), b"explicit");
    assert_eq!(sent.headers()["content-type"], "text/plain");
}
