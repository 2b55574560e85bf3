use async_trait::async_trait;

use crate::{
    core::{error::InterceptorError, response::InterceptorResponse},
    ports::{
        http_client::HttpClientError,
        interceptor::{HookResult, Interceptor},
    },
};

/// Turns non-2xx responses into [`HttpClientError::BackendError`] failures,
/// so interceptors registered earlier see them through `on_err`.
#[derive(Default)]
pub struct StatusErrorInterceptor;

impl StatusErrorInterceptor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Interceptor for StatusErrorInterceptor {
    fn name(&self) -> &str {
        "status_error"
    }

    async fn on_response(
        &self,
        response: &InterceptorResponse,
        _index: usize,
    ) -> HookResult<InterceptorResponse> {
        let Some(status) = response.response().map(|r| r.status()) else {
            return Ok(None);
        };
        if status.is_success() {
            return Ok(None);
        }

        tracing::debug!("Treating status {} from {} as a failure", status, response.url());
        let err = HttpClientError::BackendError {
            url: response.url().to_string(),
            status,
        };
        Ok(Some(response.clone().with_err(InterceptorError::from(err))))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;
    use http::{Request, Response, StatusCode};

    use super::*;
    use crate::{
        core::service::InterceptorService,
        ports::http_client::{HttpClient, HttpClientResult, HttpResponse},
    };

    struct FixedStatus(StatusCode);

    #[async_trait]
    impl HttpClient for FixedStatus {
        async fn send_request(&self, _req: Request<Bytes>) -> HttpClientResult<HttpResponse> {
            Ok(Response::builder().status(self.0).body(Bytes::new()).unwrap())
        }
    }

    #[tokio::test]
    async fn test_error_status_becomes_backend_error() {
        let service = InterceptorService::new(Arc::new(FixedStatus(StatusCode::BAD_GATEWAY)))
            .with_interceptor(Arc::new(StatusErrorInterceptor::new()));

        let err = service.get("http://svc/down", None).await.unwrap_err();
        match err.as_transport() {
            Some(HttpClientError::BackendError { url, status }) => {
                assert_eq!(url, "http://svc/down");
                assert_eq!(*status, StatusCode::BAD_GATEWAY);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let service = InterceptorService::new(Arc::new(FixedStatus(StatusCode::CREATED)))
            .with_interceptor(Arc::new(StatusErrorInterceptor::new()));

        let response = service.get("http://svc/new", None).await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
