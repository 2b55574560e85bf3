use async_trait::async_trait;

use crate::core::{
    error::InterceptorError, request::InterceptorRequest, response::InterceptorResponse,
};

/// Result of a hook: `Ok(None)` keeps the envelope unchanged, `Ok(Some(_))`
/// replaces it, `Err(_)` is captured by the chain at the hook's index.
pub type HookResult<T> = Result<Option<T>, InterceptorError>;

/// Interceptor defines the port (interface) for a unit of the chain.
///
/// Every hook is optional; the default implementations leave the envelope
/// untouched. `before_request` runs in registration order, the response
/// hooks run in reverse registration order. The `index` argument is the
/// interceptor's zero based position in the chain.
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    /// Stable name used in logs and error messages.
    fn name(&self) -> &str {
        "interceptor"
    }

    /// Inspect or transform the outgoing request.
    async fn before_request(
        &self,
        _request: &InterceptorRequest,
        _index: usize,
    ) -> HookResult<InterceptorRequest> {
        Ok(None)
    }

    /// Inspect or transform a successful response.
    async fn on_response(
        &self,
        _response: &InterceptorResponse,
        _index: usize,
    ) -> HookResult<InterceptorResponse> {
        Ok(None)
    }

    /// Handle a failure raised by the transport or a later interceptor.
    ///
    /// Attaching a response resolves the failure for the remaining interceptors.
    async fn on_err(
        &self,
        _response: &InterceptorResponse,
        _index: usize,
    ) -> HookResult<InterceptorResponse> {
        Ok(None)
    }

    /// Produce a response for a request that was short circuited at or
    /// after this interceptor.
    async fn on_short_circuit(
        &self,
        _response: &InterceptorResponse,
        _index: usize,
    ) -> HookResult<InterceptorResponse> {
        Ok(None)
    }

    /// Notification that a later interceptor forced the outcome. The
    /// envelope can no longer be changed.
    async fn on_force_complete_or_force_return(
        &self,
        _response: &InterceptorResponse,
        _index: usize,
    ) {
    }
}
