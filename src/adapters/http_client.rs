use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use eyre::Result;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, Version, header, header::HeaderValue};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use rustls_native_certs::load_native_certs;
use tokio::time::timeout;
use tracing::Instrument;

use crate::{
    config::models::TransportConfig,
    ports::http_client::{HttpClient, HttpClientError, HttpClientResult, HttpResponse},
    tracing_setup::create_transport_span,
};

/// HTTP client adapter using Hyper with Rustls.
///
/// Responsibilities:
/// * Adds a small set of default headers (User-Agent, Accept) when absent
/// * Sets the Host header and rejects URIs without a host
/// * Buffers the response body so the chain can clone and inspect it
/// * Applies the per client timeout to the whole exchange
///
/// Retries live in the chain's response transformer, not here.
pub struct HttpClientAdapter {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    timeout: Option<Duration>,
    user_agent: HeaderValue,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter without a timeout.
    pub fn new() -> Result<Self> {
        // Install default crypto provider for rustls if not already set
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false); // Allow HTTPS URLs

        let mut root_cert_store = rustls::RootCertStore::empty();
        let native_certs = load_native_certs();

        if !native_certs.certs.is_empty() {
            for cert in native_certs.certs {
                if root_cert_store.add(cert).is_err() {
                    tracing::warn!("Failed to add native certificate to rustls RootCertStore");
                }
            }
            tracing::debug!("Loaded {} native root certificates.", root_cert_store.len());
        }

        if !native_certs.errors.is_empty() {
            tracing::warn!(
                "Some native certificates failed to load: {:?}",
                native_certs.errors
            );
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new()).build::<_, Full<Bytes>>(https_connector);

        tracing::debug!("Created HTTP/1.1 client with rustls");
        Ok(Self {
            client,
            timeout: None,
            user_agent: HeaderValue::from_static(concat!(
                "http-interceptor/",
                env!("CARGO_PKG_VERSION")
            )),
        })
    }

    /// Create an adapter from the `[transport]` configuration section.
    pub fn from_config(config: &TransportConfig) -> Result<Self> {
        let adapter = Self::new()?.with_timeout(config.timeout_duration());
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| eyre::eyre!("Invalid user agent '{}': {}", config.user_agent, e))?;
        Ok(adapter.with_user_agent(user_agent))
    }

    /// Bound every exchange (connect, send, body collection) by `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: HeaderValue) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Inject a consistent set of headers if absent (User-Agent, Accept).
    fn add_common_headers(&self, req: &mut Request<Bytes>) {
        let headers = req.headers_mut();
        if !headers.contains_key(header::USER_AGENT) {
            headers.insert(header::USER_AGENT, self.user_agent.clone());
        }
        if !headers.contains_key(header::ACCEPT) {
            headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        }
    }

    /// Set the Host header from the URI, failing when the URI has no host.
    fn set_host_header(req: &mut Request<Bytes>) -> HttpClientResult<()> {
        let Some(host_str) = req.uri().host() else {
            tracing::error!("Outgoing URI has no host: {}", req.uri());
            return Err(HttpClientError::InvalidRequest(
                "Outgoing URI has no host".to_string(),
            ));
        };

        let host_header_val = match req.uri().port() {
            Some(port) => HeaderValue::from_str(&format!("{host_str}:{}", port.as_u16())),
            None => HeaderValue::from_str(host_str),
        }
        .map_err(|e| HttpClientError::InvalidRequest(format!("Invalid host header: {e}")))?;

        req.headers_mut().insert(header::HOST, host_header_val);
        Ok(())
    }

    async fn exchange(&self, req: Request<Bytes>) -> HttpClientResult<HttpResponse> {
        let method = req.method().clone();
        let uri = req.uri().clone();

        let (mut parts, body) = req.into_parts();
        parts.version = Version::HTTP_11;
        let outgoing_request = Request::from_parts(parts, Full::new(body));

        let response = self.client.request(outgoing_request).await.map_err(|e| {
            tracing::error!("Error making request ({} {}): {}", method, uri, e);
            HttpClientError::ConnectionError(format!("Request to {method} {uri} failed: {e}"))
        })?;

        let (mut parts, body) = response.into_parts();
        let body = body.collect().await.map_err(|e| {
            HttpClientError::ConnectionError(format!(
                "Failed to read response body from {method} {uri}: {e}"
            ))
        })?;

        // The body is fully buffered now
        parts.headers.remove(header::TRANSFER_ENCODING);

        Ok(Response::from_parts(parts, body.to_bytes()))
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(&self, mut req: Request<Bytes>) -> HttpClientResult<HttpResponse> {
        self.add_common_headers(&mut req);
        Self::set_host_header(&mut req)?;

        let span = create_transport_span(&req.uri().to_string(), req.method().as_str());

        async move {
            tracing::debug!("Sending request: {} {}", req.method(), req.uri());
            tracing::trace!("Outgoing request headers: {:?}", req.headers());

            let result = match self.timeout {
                Some(limit) => match timeout(limit, self.exchange(req)).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!("Request timed out after {:?}", limit);
                        Err(HttpClientError::Timeout(limit))
                    }
                },
                None => self.exchange(req).await,
            };

            match &result {
                Ok(response) => {
                    tracing::Span::current().record("http.status_code", response.status().as_u16());
                }
                Err(_) => {
                    tracing::Span::current().record("http.status_code", 599u16);
                }
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request<Bytes> {
        Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    #[tokio::test]
    async fn test_http_client_creation() {
        let client = HttpClientAdapter::new();
        assert!(client.is_ok());
        assert!(client.unwrap().timeout().is_none());
    }

    #[tokio::test]
    async fn test_from_config_applies_timeout() {
        let config = TransportConfig {
            timeout: Some("250ms".to_string()),
            user_agent: "probe/1.0".to_string(),
        };
        let client = HttpClientAdapter::from_config(&config).unwrap();
        assert_eq!(client.timeout(), Some(Duration::from_millis(250)));

        let mut req = request("https://example.com");
        client.add_common_headers(&mut req);
        assert_eq!(req.headers()[header::USER_AGENT], "probe/1.0");
    }

    #[tokio::test]
    async fn test_add_common_headers_keeps_existing() {
        let client = HttpClientAdapter::new().unwrap();
        let mut req = Request::builder()
            .uri("https://example.com")
            .header(header::ACCEPT, "application/json")
            .body(Bytes::new())
            .unwrap();

        client.add_common_headers(&mut req);

        let headers = req.headers();
        assert!(headers.contains_key(header::USER_AGENT));
        assert_eq!(headers[header::ACCEPT], "application/json");
    }

    #[test]
    fn test_host_header_includes_port() {
        let mut req = request("http://localhost:8080/health");
        HttpClientAdapter::set_host_header(&mut req).unwrap();
        assert_eq!(req.headers()[header::HOST], "localhost:8080");
    }

    #[tokio::test]
    async fn test_uri_without_host_is_rejected() {
        let client = HttpClientAdapter::new().unwrap();
        let result = client.send_request(request("/relative/path")).await;
        assert!(matches!(result, Err(HttpClientError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connection_error() {
        let client = HttpClientAdapter::new()
            .unwrap()
            .with_timeout(Some(Duration::from_secs(5)));
        // Port 9 (discard) on loopback is refused on test machines
        let result = client.send_request(request("http://127.0.0.1:9/")).await;
        assert!(matches!(
            result,
            Err(HttpClientError::ConnectionError(_)) | Err(HttpClientError::Timeout(_))
        ));
    }
}
