use async_trait::async_trait;
use http::{HeaderName, HeaderValue};

use crate::{
    core::{error::InterceptorError, request::InterceptorRequest},
    ports::interceptor::{HookResult, Interceptor},
};

/// Shared data key holding the request ID of the current call.
pub const REQUEST_ID_KEY: &str = "request_id";

/// Tags every request with a UUID v4 request ID unless the caller set one.
///
/// The ID that ends up on the wire is stored under [`REQUEST_ID_KEY`] so later
/// interceptors can correlate logs.
pub struct RequestIdInterceptor {
    header: HeaderName,
}

impl RequestIdInterceptor {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }
}

impl Default for RequestIdInterceptor {
    fn default() -> Self {
        Self::new(HeaderName::from_static("x-request-id"))
    }
}

#[async_trait]
impl Interceptor for RequestIdInterceptor {
    fn name(&self) -> &str {
        "request_id"
    }

    async fn before_request(
        &self,
        request: &InterceptorRequest,
        _index: usize,
    ) -> HookResult<InterceptorRequest> {
        if let Some(existing) = request.options().headers.get(&self.header) {
            if let Ok(existing) = existing.to_str() {
                request.shared_data().insert(REQUEST_ID_KEY, existing).await?;
            }
            return Ok(None);
        }

        let request_id = uuid::Uuid::new_v4().to_string();
        let header_value = HeaderValue::from_str(&request_id)
            .map_err(|e| InterceptorError::hook(self.name(), e.to_string()))?;
        request
            .shared_data()
            .insert(REQUEST_ID_KEY, &request_id)
            .await?;
        tracing::debug!(request_id = %request_id, "Assigned request ID");

        Ok(Some(
            request.clone().with_header(self.header.clone(), header_value),
        ))
    }
}
