//! Response envelope threaded backwards through the response phase.
use crate::{
    core::{
        error::InterceptorError, options::RequestOptions, request::InterceptorRequest,
        shared_data::SharedData,
    },
    ports::http_client::HttpResponse,
};

/// Outcome of the request (response, error or unresolved short circuit)
/// plus the control flags of the response phase.
#[derive(Debug, Clone)]
pub struct InterceptorResponse {
    pub(crate) url: String,
    pub(crate) options: RequestOptions,
    pub(crate) response: Option<HttpResponse>,
    pub(crate) shared_data: SharedData,
    pub(crate) short_circuit_triggered_by: Option<usize>,
    pub(crate) force_return_response: bool,
    pub(crate) force_request_completion: bool,
    pub(crate) response_generated_by_short_circuit_handler: bool,
    pub(crate) err: Option<InterceptorError>,
    pub(crate) err_encountered_at: Option<usize>,
    pub(crate) err_encountered_in_request_cycle: bool,
}

impl InterceptorResponse {
    /// Carry the request state over into the response phase.
    pub(crate) fn from_request(request: InterceptorRequest) -> Self {
        Self {
            url: request.url,
            options: request.options,
            response: None,
            shared_data: request.shared_data,
            short_circuit_triggered_by: request.short_circuit_triggered_by,
            force_return_response: false,
            force_request_completion: false,
            response_generated_by_short_circuit_handler: false,
            err: request.err,
            err_encountered_at: request.err_encountered_at,
            err_encountered_in_request_cycle: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    pub fn shared_data(&self) -> &SharedData {
        &self.shared_data
    }

    pub fn short_circuit_triggered_by(&self) -> Option<usize> {
        self.short_circuit_triggered_by
    }

    pub fn force_return_response(&self) -> bool {
        self.force_return_response
    }

    pub fn force_request_completion(&self) -> bool {
        self.force_request_completion
    }

    pub fn response_generated_by_short_circuit_handler(&self) -> bool {
        self.response_generated_by_short_circuit_handler
    }

    pub fn err(&self) -> Option<&InterceptorError> {
        self.err.as_ref()
    }

    pub fn err_encountered_at(&self) -> Option<usize> {
        self.err_encountered_at
    }

    /// True when the error came from the transport call rather than a hook.
    pub fn err_encountered_in_request_cycle(&self) -> bool {
        self.err_encountered_in_request_cycle
    }

    /// A short circuit was triggered and nothing along the response phase has
    /// resolved it into a response or an error yet.
    pub fn is_short_circuited(&self) -> bool {
        self.short_circuit_triggered_by.is_some() && self.response.is_none() && self.err.is_none()
    }

    /// Attach a response. Earlier interceptors then see it through `on_response`.
    pub fn with_response(mut self, response: HttpResponse) -> Self {
        self.response = Some(response);
        self
    }

    /// Replace the response with a failure. Earlier interceptors then see it
    /// through `on_err`.
    pub fn with_err(mut self, err: InterceptorError) -> Self {
        self.response = None;
        self.err = Some(err);
        self
    }

    /// Freeze the outcome: remaining interceptors are only notified.
    pub fn with_force_return_response(mut self, force: bool) -> Self {
        self.force_return_response = force;
        self
    }

    /// Complete the call without a value once remaining interceptors have
    /// been notified.
    pub fn with_force_request_completion(mut self, force: bool) -> Self {
        self.force_request_completion = force;
        self
    }

    pub(crate) fn transport_failed(mut self, err: InterceptorError, interceptor_count: usize) -> Self {
        self.response = None;
        self.err = Some(err);
        self.err_encountered_at = Some(interceptor_count);
        self.err_encountered_in_request_cycle = true;
        self
    }

    pub(crate) fn failed_at(mut self, err: InterceptorError, index: usize) -> Self {
        self.response = None;
        self.err = Some(err);
        self.err_encountered_at = Some(index);
        self.err_encountered_in_request_cycle = false;
        self
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.force_request_completion || self.force_return_response
    }
}
