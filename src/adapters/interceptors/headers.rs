use std::collections::HashMap;

use async_trait::async_trait;
use http::{HeaderName, HeaderValue};

use crate::{
    core::request::InterceptorRequest,
    ports::interceptor::{HookResult, Interceptor},
};

/// Adds configured headers to every request that does not already carry them.
pub struct HeadersInterceptor {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl HeadersInterceptor {
    /// Build from name/value pairs. Invalid pairs are skipped with a warning.
    pub fn new(headers: &HashMap<String, String>) -> Self {
        let mut parsed = Vec::with_capacity(headers.len());
        for (name, value) in headers {
            if let (Ok(header_name), Ok(header_value)) =
                (name.parse::<HeaderName>(), HeaderValue::from_str(value))
            {
                parsed.push((header_name, header_value));
            } else {
                tracing::warn!("Invalid custom header: {} = {}", name, value);
            }
        }
        // HashMap iteration order is random; keep the wire order stable
        parsed.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
        Self { headers: parsed }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

#[async_trait]
impl Interceptor for HeadersInterceptor {
    fn name(&self) -> &str {
        "headers"
    }

    async fn before_request(
        &self,
        request: &InterceptorRequest,
        _index: usize,
    ) -> HookResult<InterceptorRequest> {
        let missing: Vec<_> = self
            .headers
            .iter()
            .filter(|(name, _)| !request.options().headers.contains_key(name))
            .collect();
        if missing.is_empty() {
            return Ok(None);
        }

        let mut next = request.clone();
        for (name, value) in missing {
            next = next.with_header(name.clone(), value.clone());
        }
        Ok(Some(next))
    }
}
