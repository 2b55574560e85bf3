//! Chain-free access to the transport.
//!
//! Interceptors and response transformers use [`HttpDirect`] for side-channel
//! calls (token refresh, probes) so those calls never re-enter the chain.
use std::sync::Arc;

use bytes::Bytes;
use http::Method;

use crate::{
    core::options::RequestOptions,
    ports::http_client::{HttpClient, HttpClientResult, HttpResponse},
};

/// Mirror of the transport surface that bypasses every interceptor.
#[derive(Clone)]
pub struct HttpDirect {
    client: Arc<dyn HttpClient>,
}

impl HttpDirect {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// Send a request with the method carried by `options` (GET by default).
    pub async fn request(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> HttpClientResult<HttpResponse> {
        let options = options.unwrap_or_default();
        let req = options.to_http_request(url)?;
        tracing::debug!("Direct {} {}", req.method(), req.uri());
        self.client.send_request(req).await
    }

    pub async fn get(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> HttpClientResult<HttpResponse> {
        self.request(url, Some(with_method(options, Method::GET)))
            .await
    }

    pub async fn post(
        &self,
        url: &str,
        body: impl Into<Bytes>,
        options: Option<RequestOptions>,
    ) -> HttpClientResult<HttpResponse> {
        self.request(url, Some(with_body(with_method(options, Method::POST), body)))
            .await
    }

    pub async fn put(
        &self,
        url: &str,
        body: impl Into<Bytes>,
        options: Option<RequestOptions>,
    ) -> HttpClientResult<HttpResponse> {
        self.request(url, Some(with_body(with_method(options, Method::PUT), body)))
            .await
    }

    pub async fn delete(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> HttpClientResult<HttpResponse> {
        self.request(url, Some(with_method(options, Method::DELETE)))
            .await
    }

    pub async fn patch(
        &self,
        url: &str,
        body: impl Into<Bytes>,
        options: Option<RequestOptions>,
    ) -> HttpClientResult<HttpResponse> {
        self.request(url, Some(with_body(with_method(options, Method::PATCH), body)))
            .await
    }

    pub async fn head(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> HttpClientResult<HttpResponse> {
        self.request(url, Some(with_method(options, Method::HEAD)))
            .await
    }

    pub async fn options(
        &self,
        url: &str,
        options: Option<RequestOptions>,
    ) -> HttpClientResult<HttpResponse> {
        self.request(url, Some(with_method(options, Method::OPTIONS)))
            .await
    }
}

/// Re-sendable handle for the transport call of one request.
///
/// Each [`send`](TransportCall::send) issues a fresh call with the request as
/// it left the `before_request` phase.
#[derive(Clone)]
pub struct TransportCall {
    direct: HttpDirect,
    url: String,
    options: RequestOptions,
}

impl TransportCall {
    pub fn new(direct: HttpDirect, url: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            direct,
            url: url.into(),
            options,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub async fn send(&self) -> HttpClientResult<HttpResponse> {
        self.direct
            .request(&self.url, Some(self.options.clone()))
            .await
    }
}

/// Force `method` onto the (possibly absent) options.
pub(crate) fn with_method(options: Option<RequestOptions>, method: Method) -> RequestOptions {
    options.unwrap_or_default().with_method(method)
}

/// Use `body` unless the options already carry one.
pub(crate) fn with_body(mut options: RequestOptions, body: impl Into<Bytes>) -> RequestOptions {
    if options.body.is_none() {
        options.body = Some(body.into());
    }
    options
}
