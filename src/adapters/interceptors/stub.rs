use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use eyre::{Result, eyre};
use http::{HeaderValue, Response, StatusCode, header};

use crate::{
    config::models::StubConfig,
    core::{error::InterceptorError, request::InterceptorRequest, response::InterceptorResponse},
    ports::interceptor::{HookResult, Interceptor},
};

/// Shared data key naming the stub prefix that answered the call.
pub const STUB_PREFIX_KEY: &str = "stub.prefix";

#[derive(Debug, Clone)]
struct Stub {
    status: StatusCode,
    body: Bytes,
    content_type: Option<HeaderValue>,
}

/// Serves canned responses for URL prefixes without touching the network.
///
/// A matching request is short circuited in `before_request`; the canned
/// response is produced in `on_short_circuit`. With several matching prefixes
/// the longest one wins.
pub struct StubInterceptor {
    stubs: HashMap<String, Stub>,
}

impl StubInterceptor {
    pub fn new(stubs: &HashMap<String, StubConfig>) -> Result<Self> {
        let mut parsed = HashMap::with_capacity(stubs.len());
        for (prefix, config) in stubs {
            let status = StatusCode::from_u16(config.status)
                .map_err(|e| eyre!("Invalid status {} for stub '{}': {}", config.status, prefix, e))?;
            let content_type = config
                .content_type
                .as_deref()
                .map(HeaderValue::from_str)
                .transpose()
                .map_err(|e| eyre!("Invalid content type for stub '{}': {}", prefix, e))?;
            parsed.insert(
                prefix.clone(),
                Stub {
                    status,
                    body: Bytes::from(config.body.clone()),
                    content_type,
                },
            );
        }
        Ok(Self { stubs: parsed })
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }

    /// Longest-prefix match of `url` against the configured stubs.
    fn find_matching_stub(&self, url: &str) -> Option<(&str, &Stub)> {
        self.stubs
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(prefix, stub)| (prefix.as_str(), stub))
    }

    fn render(&self, stub: &Stub) -> Result<Response<Bytes>, InterceptorError> {
        let mut builder = Response::builder().status(stub.status);
        if let Some(content_type) = &stub.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type.clone());
        }
        builder
            .body(stub.body.clone())
            .map_err(|e| InterceptorError::hook(self.name(), e.to_string()))
    }
}

#[async_trait]
impl Interceptor for StubInterceptor {
    fn name(&self) -> &str {
        "stub"
    }

    async fn before_request(
        &self,
        request: &InterceptorRequest,
        _index: usize,
    ) -> HookResult<InterceptorRequest> {
        let Some((prefix, _)) = self.find_matching_stub(request.url()) else {
            return Ok(None);
        };

        tracing::debug!("Stub '{}' matches {}, short circuiting", prefix, request.url());
        request.shared_data().insert(STUB_PREFIX_KEY, prefix).await?;
        Ok(Some(request.clone().with_short_circuit(true)))
    }

    async fn on_short_circuit(
        &self,
        response: &InterceptorResponse,
        _index: usize,
    ) -> HookResult<InterceptorResponse> {
        // Only answer short circuits this interceptor requested
        let Some(prefix) = response.shared_data().get::<String>(STUB_PREFIX_KEY).await else {
            return Ok(None);
        };
        let Some(stub) = self.stubs.get(&prefix) else {
            return Ok(None);
        };

        let canned = self.render(stub)?;
        tracing::info!("Serving stubbed {} for {}", canned.status(), response.url());
        Ok(Some(response.clone().with_response(canned)))
    }
}
