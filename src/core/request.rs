//! Request envelope threaded through the `before_request` phase.
use bytes::Bytes;
use http::{HeaderValue, Method, header::IntoHeaderName};

use crate::core::{error::InterceptorError, options::RequestOptions, shared_data::SharedData};

/// Snapshot of an outgoing request plus the chain control flags.
///
/// Hooks receive a borrowed envelope and hand back a modified copy built with
/// the `with_*` helpers. Bookkeeping fields (short circuit claim, captured
/// error) are only written by the engine.
#[derive(Debug, Clone)]
pub struct InterceptorRequest {
    pub(crate) url: String,
    pub(crate) options: RequestOptions,
    pub(crate) shared_data: SharedData,
    pub(crate) short_circuit_at_current_step: bool,
    pub(crate) also_force_request_completion: bool,
    pub(crate) already_short_circuited: bool,
    pub(crate) short_circuit_triggered_by: Option<usize>,
    pub(crate) err: Option<InterceptorError>,
    pub(crate) err_encountered_at: Option<usize>,
}

impl InterceptorRequest {
    /// Create an envelope for `url`.
    ///
    /// Uses the shared data carried by `options` or starts an empty map.
    pub fn new(url: impl Into<String>, options: RequestOptions) -> Self {
        let shared_data = options.shared_data.clone().unwrap_or_default();
        Self {
            url: url.into(),
            options,
            shared_data,
            short_circuit_at_current_step: false,
            also_force_request_completion: false,
            already_short_circuited: false,
            short_circuit_triggered_by: None,
            err: None,
            err_encountered_at: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn method(&self) -> &Method {
        &self.options.method
    }

    pub fn shared_data(&self) -> &SharedData {
        &self.shared_data
    }

    pub fn short_circuit_at_current_step(&self) -> bool {
        self.short_circuit_at_current_step
    }

    pub fn also_force_request_completion(&self) -> bool {
        self.also_force_request_completion
    }

    pub fn already_short_circuited(&self) -> bool {
        self.already_short_circuited
    }

    /// Zero based index of the interceptor that asked for the short circuit.
    pub fn short_circuit_triggered_by(&self) -> Option<usize> {
        self.short_circuit_triggered_by
    }

    pub fn err(&self) -> Option<&InterceptorError> {
        self.err.as_ref()
    }

    /// Zero based index of the failing interceptor; equals the interceptor
    /// count when the transport call itself failed.
    pub fn err_encountered_at(&self) -> Option<usize> {
        self.err_encountered_at
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Replace the options. The shared data of the envelope is kept.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.options.method = method;
        self
    }

    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.options.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.options.body = Some(body.into());
        self
    }

    /// Stop the `before_request` phase after the current interceptor.
    ///
    /// Unless [`with_also_force_request_completion`](Self::with_also_force_request_completion)
    /// is set too, the response phase starts at the current interceptor so its
    /// `on_short_circuit` hook can produce a synthetic response.
    pub fn with_short_circuit(mut self, short_circuit: bool) -> Self {
        self.short_circuit_at_current_step = short_circuit;
        self
    }

    /// Combined with a short circuit, complete the call without a value and
    /// without running any response hook.
    pub fn with_also_force_request_completion(mut self, force: bool) -> Self {
        self.also_force_request_completion = force;
        self
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.err.is_some() || self.already_short_circuited
    }

    /// Convert a pending short circuit request into a claimed one, attributed
    /// to the interceptor that ran right before `index`.
    pub(crate) fn claim_short_circuit(mut self, index: usize) -> Self {
        self.short_circuit_at_current_step = false;
        self.already_short_circuited = true;
        self.short_circuit_triggered_by = Some(index.saturating_sub(1));
        self
    }

    pub(crate) fn failed_at(mut self, err: InterceptorError, index: usize) -> Self {
        self.err = Some(err);
        self.err_encountered_at = Some(index);
        self
    }
}
