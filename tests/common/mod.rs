//! Mock transport and scripted interceptors shared by the integration tests.
#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_interceptor::{
    HookResult, HttpClient, HttpClientError, HttpResponse, Interceptor, InterceptorError,
    InterceptorRequest, InterceptorResponse, ports::http_client::HttpClientResult,
};

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn ok_response(body: &str) -> HttpResponse {
    Response::builder()
        .status(StatusCode::OK)
        .body(Bytes::from(body.to_string()))
        .unwrap()
}

pub fn body_of(response: &HttpResponse) -> String {
    String::from_utf8_lossy(response.body()).into_owned()
}

/// Transport double: fails the first `fail_first` calls with a connection
/// error, then answers with `status` and `body`.
pub struct MockClient {
    calls: AtomicUsize,
    fail_first: usize,
    status: StatusCode,
    body: Bytes,
    seen: Mutex<Vec<Request<Bytes>>>,
}

impl MockClient {
    pub fn ok(body: &'static str) -> Arc<Self> {
        Self::build(0, StatusCode::OK, body)
    }

    pub fn with_status(status: StatusCode) -> Arc<Self> {
        Self::build(0, status, "")
    }

    pub fn failing() -> Arc<Self> {
        Self::build(usize::MAX, StatusCode::OK, "")
    }

    pub fn flaky(fail_first: usize) -> Arc<Self> {
        Self::build(fail_first, StatusCode::OK, "recovered by retry")
    }

    fn build(fail_first: usize, status: StatusCode, body: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_first,
            status,
            body: Bytes::from_static(body.as_bytes()),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<Request<Bytes>> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn send_request(&self, req: Request<Bytes>) -> HttpClientResult<HttpResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(req);
        if call < self.fail_first {
            return Err(HttpClientError::ConnectionError("mock refused".to_string()));
        }
        Ok(Response::builder()
            .status(self.status)
            .header("x-mock", "1")
            .body(self.body.clone())
            .unwrap())
    }
}

/// Interceptor that logs every hook call as `name:hook@index` and performs
/// the scripted actions.
#[derive(Default)]
pub struct Probe {
    name: &'static str,
    log: Log,
    short_circuit: bool,
    force_completion: bool,
    fail_before: bool,
    fail_after: bool,
    panic_before: bool,
    recover_on_err: bool,
    answer_short_circuit: bool,
    force_return: bool,
    force_complete_after: bool,
    rewrite_body: bool,
}

impl Probe {
    pub fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: log.clone(),
            ..Self::default()
        }
    }

    pub fn short_circuit(mut self) -> Self {
        self.short_circuit = true;
        self
    }

    pub fn force_completion(mut self) -> Self {
        self.force_completion = true;
        self
    }

    pub fn fail_before(mut self) -> Self {
        self.fail_before = true;
        self
    }

    pub fn fail_after(mut self) -> Self {
        self.fail_after = true;
        self
    }

    pub fn panic_before(mut self) -> Self {
        self.panic_before = true;
        self
    }

    pub fn recover_on_err(mut self) -> Self {
        self.recover_on_err = true;
        self
    }

    pub fn answer_short_circuit(mut self) -> Self {
        self.answer_short_circuit = true;
        self
    }

    pub fn force_return(mut self) -> Self {
        self.force_return = true;
        self
    }

    pub fn force_complete_after(mut self) -> Self {
        self.force_complete_after = true;
        self
    }

    pub fn rewrite_body(mut self) -> Self {
        self.rewrite_body = true;
        self
    }

    pub fn arc(self) -> Arc<dyn Interceptor> {
        Arc::new(self)
    }

    fn record(&self, hook: &str, index: usize) {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}@{}", self.name, hook, index));
    }
}

#[async_trait]
impl Interceptor for Probe {
    fn name(&self) -> &str {
        self.name
    }

    async fn before_request(
        &self,
        request: &InterceptorRequest,
        index: usize,
    ) -> HookResult<InterceptorRequest> {
        self.record("before", index);
        if self.panic_before {
            panic!("{} exploded", self.name);
        }
        if self.fail_before {
            return Err(InterceptorError::hook(self.name, "before_request failed"));
        }
        if self.short_circuit {
            return Ok(Some(
                request
                    .clone()
                    .with_short_circuit(true)
                    .with_also_force_request_completion(self.force_completion),
            ));
        }
        Ok(None)
    }

    async fn on_response(
        &self,
        response: &InterceptorResponse,
        index: usize,
    ) -> HookResult<InterceptorResponse> {
        self.record("on_response", index);
        if self.fail_after {
            return Err(InterceptorError::hook(self.name, "on_response failed"));
        }
        if self.force_return {
            return Ok(Some(response.clone().with_force_return_response(true)));
        }
        if self.force_complete_after {
            return Ok(Some(response.clone().with_force_request_completion(true)));
        }
        if self.rewrite_body {
            return Ok(Some(response.clone().with_response(ok_response(self.name))));
        }
        Ok(None)
    }

    async fn on_err(
        &self,
        response: &InterceptorResponse,
        index: usize,
    ) -> HookResult<InterceptorResponse> {
        self.record("on_err", index);
        if self.recover_on_err {
            return Ok(Some(response.clone().with_response(ok_response("recovered"))));
        }
        Ok(None)
    }

    async fn on_short_circuit(
        &self,
        response: &InterceptorResponse,
        index: usize,
    ) -> HookResult<InterceptorResponse> {
        self.record("on_short_circuit", index);
        if self.answer_short_circuit {
            let body = format!(
                "{} answered, triggered by {:?}",
                self.name,
                response.short_circuit_triggered_by()
            );
            return Ok(Some(response.clone().with_response(ok_response(&body))));
        }
        Ok(None)
    }

    async fn on_force_complete_or_force_return(&self, _response: &InterceptorResponse, index: usize) {
        self.record("forced", index);
    }
}
