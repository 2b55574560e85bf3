use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use hyper::{Request, Response, StatusCode};
use thiserror::Error;

/// Custom error type for HTTP client operations
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum HttpClientError {
    /// Error when connection to the remote server fails
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error when request times out
    #[error("Timeout error after {0:?}")]
    Timeout(Duration),

    /// Error when request is invalid
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Error when the server answers with an unacceptable status code
    #[error("Server returned error status: {status}, url: {url}")]
    BackendError {
        /// The URL that was requested
        url: String,
        /// The status code returned by the server
        status: StatusCode,
    },
}

/// Result type alias for HTTP client operations
pub type HttpClientResult<T> = Result<T, HttpClientError>;

/// A fully buffered HTTP response as seen by the interceptor chain.
pub type HttpResponse = Response<Bytes>;

/// HttpClient defines the port (interface) for the transport that performs
/// the actual network call.
///
/// Implementations never see the interceptor chain; they receive a request
/// that already went through every `before_request` hook.
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Send an HTTP request to a remote server
    ///
    /// # Arguments
    /// * `req` - The HTTP request to send
    ///
    /// # Returns
    /// A future that resolves to the buffered response or a transport error
    async fn send_request(&self, req: Request<Bytes>) -> HttpClientResult<HttpResponse>;
}
