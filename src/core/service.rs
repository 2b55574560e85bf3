//! Interceptor chain execution engine.
//!
//! One call through [`InterceptorService`] runs three strictly sequential
//! stages:
//! 1. `before_request` hooks, left to right, until the end of the chain, a
//!    captured failure or a short circuit
//! 2. the transport call (skipped after a failure or a short circuit),
//!    optionally wrapped by the [`ResponseTransformer`]
//! 3. response hooks, right to left, starting at the failing interceptor,
//!    the short circuiting interceptor or the last interceptor
//!
//! Every hook is awaited before the next index runs, so interceptors can use
//! the request's [`SharedData`](crate::core::SharedData) without racing each
//! other. Concurrent calls share the interceptor list but nothing else.
//! Dropping the returned future cancels the in-flight hook or transport call.
use std::{future::Future, panic::AssertUnwindSafe, sync::Arc, time::Instant};

use bytes::Bytes;
use futures_util::FutureExt;
use http::Method;
use tracing::Instrument;

use crate::{
    core::{
        direct::{HttpDirect, TransportCall, with_body, with_method},
        error::{InterceptorError, InterceptorResult},
        options::RequestOptions,
        request::InterceptorRequest,
        response::InterceptorResponse,
    },
    metrics,
    ports::{
        http_client::{HttpClient, HttpResponse},
        interceptor::{HookResult, Interceptor},
        response_transformer::ResponseTransformer,
    },
};

/// Which response hook a step dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseHook {
    OnErr,
    OnShortCircuit,
    OnResponse,
}

impl ResponseHook {
    fn select(response: &InterceptorResponse) -> Self {
        if response.err.is_some() && response.response.is_none() {
            Self::OnErr
        } else if response.is_short_circuited() {
            Self::OnShortCircuit
        } else {
            Self::OnResponse
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::OnErr => "on_err",
            Self::OnShortCircuit => "on_short_circuit",
            Self::OnResponse => "on_response",
        }
    }
}

/// HTTP client front end that runs every call through the registered
/// interceptors.
///
/// Register interceptors before sending traffic; registration needs `&mut self`
/// so the list cannot change while requests are in flight. Share the
/// configured service behind an `Arc`.
pub struct InterceptorService {
    client: Arc<dyn HttpClient>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    response_transformer: Option<Arc<dyn ResponseTransformer>>,
}

impl InterceptorService {
    /// Create a service with an empty chain on top of `client`.
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            interceptors: Vec::new(),
            response_transformer: None,
        }
    }

    /// Append an interceptor to the end of the chain.
    pub fn add_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        tracing::debug!(
            "Registered interceptor '{}' at step {}",
            interceptor.name(),
            self.interceptors.len()
        );
        self.interceptors.push(interceptor);
    }

    /// Chainable form of [`add_interceptor`](Self::add_interceptor).
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.add_interceptor(interceptor);
        self
    }

    /// Install the response transformer, replacing any previous one.
    pub fn set_response_transformer(&mut self, transformer: Arc<dyn ResponseTransformer>) {
        self.response_transformer = Some(transformer);
    }

    pub fn with_response_transformer(mut self, transformer: Arc<dyn ResponseTransformer>) -> Self {
        self.set_response_transformer(transformer);
        self
    }

    pub fn interceptor_count(&self) -> usize {
        self.interceptors.len()
    }

    /// Facade over the transport that bypasses the chain.
    pub fn direct(&self) -> HttpDirect {
        HttpDirect::new(self.client.clone())
    }

    /// Run a request through the chain.
    ///
    /// Returns `Ok(None)` when an interceptor forced completion of the call.
    pub async fn request(
        &self,
        url: impl Into<String>,
        options: Option<RequestOptions>,
    ) -> InterceptorResult<Option<HttpResponse>> {
        let request = InterceptorRequest::new(url, options.unwrap_or_default());
        self.execute(request).await
    }

    pub async fn get(
        &self,
        url: impl Into<String>,
        options: Option<RequestOptions>,
    ) -> InterceptorResult<Option<HttpResponse>> {
        self.request(url, Some(with_method(options, Method::GET)))
            .await
    }

    pub async fn post(
        &self,
        url: impl Into<String>,
        body: impl Into<Bytes>,
        options: Option<RequestOptions>,
    ) -> InterceptorResult<Option<HttpResponse>> {
        self.request(url, Some(with_body(with_method(options, Method::POST), body)))
            .await
    }

    pub async fn put(
        &self,
        url: impl Into<String>,
        body: impl Into<Bytes>,
        options: Option<RequestOptions>,
    ) -> InterceptorResult<Option<HttpResponse>> {
        self.request(url, Some(with_body(with_method(options, Method::PUT), body)))
            .await
    }

    pub async fn delete(
        &self,
        url: impl Into<String>,
        options: Option<RequestOptions>,
    ) -> InterceptorResult<Option<HttpResponse>> {
        self.request(url, Some(with_method(options, Method::DELETE)))
            .await
    }

    pub async fn patch(
        &self,
        url: impl Into<String>,
        body: impl Into<Bytes>,
        options: Option<RequestOptions>,
    ) -> InterceptorResult<Option<HttpResponse>> {
        self.request(url, Some(with_body(with_method(options, Method::PATCH), body)))
            .await
    }

    pub async fn head(
        &self,
        url: impl Into<String>,
        options: Option<RequestOptions>,
    ) -> InterceptorResult<Option<HttpResponse>> {
        self.request(url, Some(with_method(options, Method::HEAD)))
            .await
    }

    pub async fn options(
        &self,
        url: impl Into<String>,
        options: Option<RequestOptions>,
    ) -> InterceptorResult<Option<HttpResponse>> {
        self.request(url, Some(with_method(options, Method::OPTIONS)))
            .await
    }

    async fn execute(&self, request: InterceptorRequest) -> InterceptorResult<Option<HttpResponse>> {
        let span = tracing::info_span!(
            "interceptor_chain",
            http.method = %request.method(),
            http.url = %request.url(),
            interceptors = self.interceptors.len(),
            outcome = tracing::field::Empty,
        );

        async move {
            let start = Instant::now();
            let result = self.run_chain(request).await;
            let outcome = match &result {
                Ok(Some(_)) => "response",
                Ok(None) => "completed",
                Err(_) => "error",
            };
            tracing::Span::current().record("outcome", outcome);
            metrics::increment_chain_requests(outcome);
            metrics::record_chain_duration(outcome, start.elapsed());
            result
        }
        .instrument(span)
        .await
    }

    async fn run_chain(&self, request: InterceptorRequest) -> InterceptorResult<Option<HttpResponse>> {
        let Some(request) = self.run_before_interceptors(request).await else {
            tracing::info!("Request completion forced during before_request phase");
            return Ok(None);
        };

        let response = self.invoke_transport(request).await;

        let Some(response) = self.run_after_interceptors(response).await else {
            tracing::info!("Request completion forced during response phase");
            return Ok(None);
        };

        Self::resolve(response)
    }

    /// Fold `before_request` hooks left to right. `None` means the call was
    /// force completed by a short circuit.
    async fn run_before_interceptors(
        &self,
        mut request: InterceptorRequest,
    ) -> Option<InterceptorRequest> {
        for (index, interceptor) in self.interceptors.iter().enumerate() {
            if request.is_terminal() {
                // Drained: nothing left to run in this phase
                break;
            }

            if request.short_circuit_at_current_step {
                request = Self::settle_short_circuit(request, index)?;
                continue;
            }

            tracing::debug!("before_request -> '{}' at step {}", interceptor.name(), index);
            request = match guard(index, interceptor.before_request(&request, index)).await {
                Ok(Some(next)) => next,
                Ok(None) => request,
                Err(err) => {
                    tracing::warn!(
                        "before_request of '{}' failed at step {}: {}",
                        interceptor.name(),
                        index,
                        err
                    );
                    metrics::increment_hook_failures("before_request");
                    request.failed_at(err, index)
                }
            };
        }

        // The last interceptor may have asked for the short circuit itself
        if !request.is_terminal() && request.short_circuit_at_current_step {
            request = Self::settle_short_circuit(request, self.interceptors.len())?;
        }

        Some(request)
    }

    fn settle_short_circuit(
        request: InterceptorRequest,
        index: usize,
    ) -> Option<InterceptorRequest> {
        let triggered_by = index.saturating_sub(1);
        metrics::increment_short_circuits(request.also_force_request_completion);
        if request.also_force_request_completion {
            tracing::info!(
                "Short circuit with forced completion requested by step {}",
                triggered_by
            );
            return None;
        }
        tracing::debug!("Short circuit requested by step {}", triggered_by);
        Some(request.claim_short_circuit(index))
    }

    /// Issue the transport call unless the before phase ended in a failure or
    /// a short circuit, and wrap the outcome into the response envelope.
    async fn invoke_transport(&self, request: InterceptorRequest) -> InterceptorResponse {
        if request.is_terminal() {
            tracing::debug!("Skipping transport call");
            return InterceptorResponse::from_request(request);
        }

        let direct = self.direct();
        let call = TransportCall::new(direct.clone(), request.url.clone(), request.options.clone());
        let result = match &self.response_transformer {
            Some(transformer) => transformer.transform(call, &request, &direct, self).await,
            None => call.send().await.map_err(InterceptorError::from),
        };

        match result {
            Ok(response) => {
                tracing::debug!("Transport returned status {}", response.status());
                InterceptorResponse::from_request(request).with_response(response)
            }
            Err(err) => {
                tracing::warn!("Transport call to {} failed: {}", request.url, err);
                InterceptorResponse::from_request(request)
                    .transport_failed(err, self.interceptors.len())
            }
        }
    }

    /// Index the response phase starts from, or `None` for an empty chain.
    fn after_phase_start(&self, response: &InterceptorResponse) -> Option<usize> {
        let last = self.interceptors.len().checked_sub(1)?;
        let start = if response.err.is_some() {
            // A transport failure is recorded at `len`; the last interceptor
            // handles it first
            response.err_encountered_at.unwrap_or(last)
        } else if response.is_short_circuited() {
            response.short_circuit_triggered_by.unwrap_or(last)
        } else {
            last
        };
        Some(start.min(last))
    }

    /// Fold response hooks right to left. `None` means the call was force
    /// completed.
    async fn run_after_interceptors(
        &self,
        mut response: InterceptorResponse,
    ) -> Option<InterceptorResponse> {
        let Some(start) = self.after_phase_start(&response) else {
            return (!response.force_request_completion).then_some(response);
        };

        for index in (0..=start).rev() {
            let interceptor = &self.interceptors[index];

            if response.is_frozen() {
                tracing::debug!(
                    "on_force_complete_or_force_return -> '{}' at step {}",
                    interceptor.name(),
                    index
                );
                let notified = AssertUnwindSafe(
                    interceptor.on_force_complete_or_force_return(&response, index),
                )
                .catch_unwind()
                .await;
                if notified.is_err() {
                    tracing::warn!(
                        "on_force_complete_or_force_return of '{}' panicked at step {}",
                        interceptor.name(),
                        index
                    );
                }
                continue;
            }

            let hook = ResponseHook::select(&response);
            tracing::debug!("{} -> '{}' at step {}", hook.as_str(), interceptor.name(), index);
            let result = match hook {
                ResponseHook::OnErr => guard(index, interceptor.on_err(&response, index)).await,
                ResponseHook::OnShortCircuit => {
                    guard(index, interceptor.on_short_circuit(&response, index)).await
                }
                ResponseHook::OnResponse => {
                    guard(index, interceptor.on_response(&response, index)).await
                }
            };

            response = match result {
                Ok(Some(mut next)) => {
                    if hook == ResponseHook::OnShortCircuit && next.response.is_some() {
                        next.response_generated_by_short_circuit_handler = true;
                    }
                    next
                }
                Ok(None) => response,
                Err(err) => {
                    tracing::warn!(
                        "{} of '{}' failed at step {}: {}",
                        hook.as_str(),
                        interceptor.name(),
                        index,
                        err
                    );
                    metrics::increment_hook_failures(hook.as_str());
                    response.failed_at(err, index)
                }
            };
        }

        (!response.force_request_completion).then_some(response)
    }

    fn resolve(response: InterceptorResponse) -> InterceptorResult<Option<HttpResponse>> {
        let short_circuited = response.is_short_circuited();
        match (response.response, response.err) {
            (Some(resolved), _) => Ok(Some(resolved)),
            (None, Some(err)) => Err(err),
            (None, None) if short_circuited => Err(InterceptorError::UnresolvedShortCircuit),
            (None, None) => Err(InterceptorError::EmptyResponse),
        }
    }
}

/// Await a hook, turning a panic into a captured failure at `index`.
async fn guard<T, F>(index: usize, hook: F) -> HookResult<T>
where
    F: Future<Output = HookResult<T>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(InterceptorError::from_panic(index, payload)),
    }
}
