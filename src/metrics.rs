//! Lightweight metrics helpers for the interceptor chain.
//!
//! This module exposes a small set of convenience functions wrapping the
//! `metrics` crate macros. It does not embed an exporter (the application can
//! install any compatible recorder) but describes the metric names it emits.
//!
//! Provided metrics (labels vary by family):
//! * `interceptor_chain_requests_total` (counter, `outcome`)
//! * `interceptor_chain_duration_seconds` (histogram, `outcome`)
//! * `interceptor_hook_failures_total` (counter, `hook`)
//! * `interceptor_short_circuits_total` (counter, `forced`)
//! * `interceptor_transport_retries_total` (counter, `method`)
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::Lazy;

pub const CHAIN_REQUESTS_TOTAL: &str = "interceptor_chain_requests_total";
pub const CHAIN_DURATION_SECONDS: &str = "interceptor_chain_duration_seconds";
pub const HOOK_FAILURES_TOTAL: &str = "interceptor_hook_failures_total";
pub const SHORT_CIRCUITS_TOTAL: &str = "interceptor_short_circuits_total";
pub const TRANSPORT_RETRIES_TOTAL: &str = "interceptor_transport_retries_total";

/// Process wide count of chain executions, kept alongside the recorder so
/// diagnostics work without an exporter installed.
static CHAIN_EXECUTIONS: Lazy<AtomicU64> = Lazy::new(|| {
    describe_counter!(
        CHAIN_REQUESTS_TOTAL,
        Unit::Count,
        "Total number of requests that went through the interceptor chain."
    );
    describe_histogram!(
        CHAIN_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of a full chain execution, hooks and transport included."
    );
    describe_counter!(
        HOOK_FAILURES_TOTAL,
        Unit::Count,
        "Failures captured from interceptor hooks (by hook)."
    );
    describe_counter!(
        SHORT_CIRCUITS_TOTAL,
        Unit::Count,
        "Short circuits requested during the before_request phase."
    );
    describe_counter!(
        TRANSPORT_RETRIES_TOTAL,
        Unit::Count,
        "Transport calls re-issued by the retry transformer."
    );

    AtomicU64::new(0)
});

/// Count one chain execution with its outcome (`response`, `completed`, `error`).
pub fn increment_chain_requests(outcome: &'static str) {
    CHAIN_EXECUTIONS.fetch_add(1, Ordering::Relaxed);
    counter!(CHAIN_REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record how long a chain execution took.
pub fn record_chain_duration(outcome: &'static str, duration: Duration) {
    histogram!(CHAIN_DURATION_SECONDS, "outcome" => outcome).record(duration.as_secs_f64());
}

/// Count a failure captured from a hook.
pub fn increment_hook_failures(hook: &'static str) {
    counter!(HOOK_FAILURES_TOTAL, "hook" => hook).increment(1);
}

/// Count a short circuit, flagging whether it force completed the call.
pub fn increment_short_circuits(forced: bool) {
    let forced = if forced { "true" } else { "false" };
    counter!(SHORT_CIRCUITS_TOTAL, "forced" => forced).increment(1);
}

/// Count a transport retry.
pub fn increment_transport_retries(method: &str) {
    counter!(TRANSPORT_RETRIES_TOTAL, "method" => method.to_string()).increment(1);
}

/// Number of chain executions observed by this process.
pub fn chain_executions() -> u64 {
    CHAIN_EXECUTIONS.load(Ordering::Relaxed)
}

/// Initialize metric descriptions (idempotent).
pub fn init_metrics() -> eyre::Result<()> {
    tracing::info!("Initializing interceptor metrics");

    // Force lazy initialization of metrics descriptions
    Lazy::force(&CHAIN_EXECUTIONS);

    Ok(())
}
