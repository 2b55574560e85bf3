use async_trait::async_trait;
use chrono::Utc;

use crate::{
    core::{request::InterceptorRequest, response::InterceptorResponse},
    ports::interceptor::{HookResult, Interceptor},
};

/// Shared data key with the start of the call (microseconds since the epoch).
pub const TIMING_STARTED_AT_KEY: &str = "timing.started_at_us";
/// Shared data key with the measured duration in milliseconds.
pub const TIMING_ELAPSED_KEY: &str = "timing.elapsed_ms";

/// Measures how long a call spends between this interceptor's before hook
/// and its response hook, using the request's shared data as the stopwatch.
#[derive(Default)]
pub struct TimingInterceptor;

impl TimingInterceptor {
    pub fn new() -> Self {
        Self
    }

    async fn stop(&self, response: &InterceptorResponse, outcome: &str) {
        let Some(started_at) = response
            .shared_data()
            .get::<i64>(TIMING_STARTED_AT_KEY)
            .await
        else {
            // The before hook never ran (an earlier interceptor failed or short circuited)
            return;
        };

        let elapsed_us = Utc::now().timestamp_micros().saturating_sub(started_at).max(0);
        let elapsed_ms = elapsed_us as f64 / 1_000.0;
        if response
            .shared_data()
            .insert(TIMING_ELAPSED_KEY, elapsed_ms)
            .await
            .is_err()
        {
            tracing::warn!("Failed to record elapsed time for {}", response.url());
        }

        let status = response.response().map(|r| r.status().as_u16());
        tracing::info!(
            "Completed {} {} ({}) status={:?} in {:.3}ms",
            response.options().method,
            response.url(),
            outcome,
            status,
            elapsed_ms
        );
    }
}

#[async_trait]
impl Interceptor for TimingInterceptor {
    fn name(&self) -> &str {
        "timing"
    }

    async fn before_request(
        &self,
        request: &InterceptorRequest,
        _index: usize,
    ) -> HookResult<InterceptorRequest> {
        tracing::debug!("Started {} {}", request.method(), request.url());
        request
            .shared_data()
            .insert(TIMING_STARTED_AT_KEY, Utc::now().timestamp_micros())
            .await?;
        Ok(None)
    }

    async fn on_response(
        &self,
        response: &InterceptorResponse,
        _index: usize,
    ) -> HookResult<InterceptorResponse> {
        self.stop(response, "response").await;
        Ok(None)
    }

    async fn on_err(
        &self,
        response: &InterceptorResponse,
        _index: usize,
    ) -> HookResult<InterceptorResponse> {
        self.stop(response, "error").await;
        Ok(None)
    }

    async fn on_short_circuit(
        &self,
        response: &InterceptorResponse,
        _index: usize,
    ) -> HookResult<InterceptorResponse> {
        self.stop(response, "short circuit").await;
        Ok(None)
    }

    async fn on_force_complete_or_force_return(&self, response: &InterceptorResponse, _index: usize) {
        self.stop(response, "forced").await;
    }
}
