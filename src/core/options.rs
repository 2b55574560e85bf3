//! Per-request configuration passed through the chain untouched by the engine.
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Request, header::IntoHeaderName};

use crate::{
    core::shared_data::SharedData,
    ports::http_client::{HttpClientError, HttpClientResult},
};

/// Method, headers and body of an outgoing request.
///
/// `shared_data` lets a caller seed the per-request shared map; when it is
/// absent the engine creates an empty one.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub shared_data: Option<SharedData>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Insert (or replace) a header.
    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_shared_data(mut self, shared_data: SharedData) -> Self {
        self.shared_data = Some(shared_data);
        self
    }

    /// Build the transport level request for `url`.
    ///
    /// The URL must be absolute (`scheme://host/...`). Headers are sent as
    /// given; no `Content-Type` is implied from the body.
    pub fn to_http_request(&self, url: &str) -> HttpClientResult<Request<Bytes>> {
        let parsed = url::Url::parse(url)
            .map_err(|e| HttpClientError::InvalidRequest(format!("Invalid URL '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(HttpClientError::InvalidRequest(format!(
                "Unsupported URL scheme '{}' in '{url}'",
                parsed.scheme()
            )));
        }

        let mut builder = Request::builder().method(self.method.clone()).uri(parsed.as_str());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers.clone());
        }

        builder
            .body(self.body.clone().unwrap_or_default())
            .map_err(|e| HttpClientError::InvalidRequest(e.to_string()))
    }
}
