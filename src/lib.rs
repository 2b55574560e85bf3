//! http-interceptor - an HTTP client with an ordered interceptor chain.
//!
//! Every call made through [`InterceptorService`] passes through the registered
//! [`Interceptor`]s twice: `before_request` hooks run in registration order, the
//! transport call is made, then the response hooks run in reverse order. An
//! interceptor can rewrite the request, short-circuit the network call and
//! answer it itself, recover from failures, freeze the response, or complete the
//! call without any value.
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use http_interceptor::{
//!     HttpClientAdapter, InterceptorService,
//!     adapters::interceptors::{RequestIdInterceptor, TimingInterceptor},
//! };
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let service = InterceptorService::new(Arc::new(HttpClientAdapter::new()?))
//!     .with_interceptor(Arc::new(RequestIdInterceptor::default()))
//!     .with_interceptor(Arc::new(TimingInterceptor::new()));
//!
//! if let Some(response) = service.get("https://example.com/", None).await? {
//!     println!("{}", response.status());
//! }
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits: the transport, interceptors and the
//! response transformer) from **adapters** (the hyper transport, built-in
//! interceptors, retries) while the chain engine lives in `core`.
//!
//! # Error Handling
//! Chain operations return [`InterceptorResult`]. Configuration loading and the
//! binary use `eyre::Result<T>` with `WrapErr` context.
//!
//! # Concurrency & Data Structures
//! Per request [`SharedData`] is an `scc::HashMap` behind an `Arc`, so every
//! envelope clone observes the same entries.
pub mod config;
pub mod metrics;
pub mod ports;
pub mod tracing_setup;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::HttpClientAdapter,
    core::{
        HttpDirect, InterceptorError, InterceptorRequest, InterceptorResponse, InterceptorResult,
        InterceptorService, RequestOptions, SharedData, TransportCall,
    },
    ports::{
        http_client::{HttpClient, HttpClientError, HttpResponse},
        interceptor::{HookResult, Interceptor},
        response_transformer::ResponseTransformer,
    },
};
