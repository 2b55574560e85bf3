//! Retrying response transformer.
use std::time::Duration;

use async_trait::async_trait;
use http::{Method, StatusCode};
use rand::Rng;

use crate::{
    config::models::RetryConfig,
    core::{
        InterceptorService,
        direct::{HttpDirect, TransportCall},
        error::{InterceptorError, InterceptorResult},
        request::InterceptorRequest,
    },
    metrics,
    ports::{
        http_client::{HttpClientError, HttpResponse},
        response_transformer::ResponseTransformer,
    },
};

/// Exponential backoff with jitter. Attempt 0 has no delay.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Up to 10% on top of the delay
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::rng().random_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Re-issues the transport call of idempotent requests on connection errors,
/// timeouts and configured response statuses.
///
/// Once retries are exhausted the last outcome is handed to the response
/// phase unchanged: a retryable status stays a response, a transport error
/// stays an error.
pub struct RetryTransformer {
    max_retries: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
    retry_on_status: Vec<StatusCode>,
}

impl RetryTransformer {
    pub fn new(config: &RetryConfig) -> Self {
        let retry_on_status = config
            .retry_on_status
            .iter()
            .filter_map(|code| match StatusCode::from_u16(*code) {
                Ok(status) => Some(status),
                Err(_) => {
                    tracing::warn!("Ignoring invalid retry status code {}", code);
                    None
                }
            })
            .collect();

        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            retry_on_status,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn is_idempotent(method: &Method) -> bool {
        matches!(
            *method,
            Method::GET | Method::HEAD | Method::OPTIONS | Method::PUT | Method::DELETE | Method::TRACE
        )
    }

    fn should_retry(&self, outcome: &Result<HttpResponse, HttpClientError>) -> bool {
        match outcome {
            Ok(response) => self.retry_on_status.contains(&response.status()),
            Err(HttpClientError::ConnectionError(_)) | Err(HttpClientError::Timeout(_)) => true,
            Err(_) => false,
        }
    }
}

impl Default for RetryTransformer {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}

#[async_trait]
impl ResponseTransformer for RetryTransformer {
    async fn transform(
        &self,
        call: TransportCall,
        request: &InterceptorRequest,
        _http: &HttpDirect,
        _service: &InterceptorService,
    ) -> InterceptorResult<HttpResponse> {
        let method = request.method().clone();
        let retries = if Self::is_idempotent(&method) {
            self.max_retries
        } else {
            0
        };

        let mut attempt = 0;
        loop {
            let outcome = call.send().await;
            if attempt >= retries || !self.should_retry(&outcome) {
                return outcome.map_err(InterceptorError::from);
            }

            attempt += 1;
            let delay = calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms);
            match &outcome {
                Ok(response) => tracing::warn!(
                    "{} {} returned {}, retry {}/{} in {:?}",
                    method,
                    call.url(),
                    response.status(),
                    attempt,
                    retries,
                    delay
                ),
                Err(err) => tracing::warn!(
                    "{} {} failed: {}, retry {}/{} in {:?}",
                    method,
                    call.url(),
                    err,
                    attempt,
                    retries,
                    delay
                ),
            }
            metrics::increment_transport_retries(method.as_str());
            tokio::time::sleep(delay).await;
        }
    }
}
