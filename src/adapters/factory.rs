use std::sync::Arc;

use eyre::{Result, WrapErr};
use http::HeaderName;

use crate::{
    adapters::{
        interceptors::{
            HeadersInterceptor, RequestIdInterceptor, StatusErrorInterceptor, StubInterceptor,
            TimingInterceptor,
        },
        retry::RetryTransformer,
    },
    config::{models::ClientConfig, validation::ClientConfigValidator},
    core::InterceptorService,
    ports::http_client::HttpClient,
};

/// Assemble an [`InterceptorService`] from configuration.
///
/// Registration order (left to right): headers, request ID, timing, status
/// errors, stubs. A retry transformer is installed when `[retry]` is set.
pub fn build_interceptor_service(
    config: &ClientConfig,
    client: Arc<dyn HttpClient>,
) -> Result<InterceptorService> {
    ClientConfigValidator::validate(config).wrap_err("Invalid client configuration")?;

    let mut service = InterceptorService::new(client);

    if !config.headers.is_empty() {
        service.add_interceptor(Arc::new(HeadersInterceptor::new(&config.headers)));
    }

    if config.request_id.enabled {
        let header = HeaderName::try_from(config.request_id.header.as_str())
            .wrap_err_with(|| format!("Invalid request ID header '{}'", config.request_id.header))?;
        service.add_interceptor(Arc::new(RequestIdInterceptor::new(header)));
    }

    if config.timing.enabled {
        service.add_interceptor(Arc::new(TimingInterceptor::new()));
    }

    if config.fail_on_error_status {
        service.add_interceptor(Arc::new(StatusErrorInterceptor::new()));
    }

    if !config.stubs.is_empty() {
        service.add_interceptor(Arc::new(StubInterceptor::new(&config.stubs)?));
    }

    if let Some(retry) = &config.retry {
        service.set_response_transformer(Arc::new(RetryTransformer::new(retry)));
    }

    tracing::info!(
        "Built interceptor service with {} interceptors (retry: {})",
        service.interceptor_count(),
        config.retry.is_some()
    );
    Ok(service)
}
