//! Configuration data structures for the interceptor client.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files. They are
//! serde friendly and carry defaults so that minimal configs remain concise.
use std::{collections::HashMap, time::Duration};

use serde::{Deserialize, Serialize};

fn default_user_agent() -> String {
    format!("http-interceptor/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_id_header() -> String {
    "x-request-id".to_string()
}

fn default_true() -> bool {
    true
}

/// Transport level settings (applied by the HTTP client adapter, not the chain)
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TransportConfig {
    /// Per call timeout in humantime notation (e.g. "30s", "1m 30s")
    pub timeout: Option<String>,
    /// User-Agent sent when the request does not carry one
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some("30s".to_string()),
            user_agent: default_user_agent(),
        }
    }
}

impl TransportConfig {
    /// Parsed timeout; `None` when unset or unparsable (validation reports the latter).
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
            .as_deref()
            .and_then(|t| humantime::parse_duration(t).ok())
    }
}

/// Request ID injection
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RequestIdConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_request_id_header")]
    pub header: String,
}

impl Default for RequestIdConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            header: default_request_id_header(),
        }
    }
}

/// Request timing logs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Retry policy for the transport call
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first one
    pub max_retries: u32,
    /// Delay before the first retry, doubled on every further attempt
    pub base_delay_ms: u64,
    /// Upper bound for a single delay
    pub max_delay_ms: u64,
    /// Response statuses that trigger a retry (connection errors and timeouts always do)
    pub retry_on_status: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
            retry_on_status: vec![502, 503, 504],
        }
    }
}

fn default_stub_status() -> u16 {
    200
}

/// Canned response served instead of calling the network
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StubConfig {
    #[serde(default = "default_stub_status")]
    pub status: u16,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Logging output
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "info" or "http_interceptor=debug"
    pub level: String,
    pub json: bool,
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            include_spans: false,
        }
    }
}

/// Top level configuration of an intercepted client.
///
/// Interceptors are registered in a fixed order: headers, request ID,
/// timing, status errors, stubs.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ClientConfig {
    pub transport: TransportConfig,
    /// Headers added to every request that does not already carry them
    pub headers: HashMap<String, String>,
    pub request_id: RequestIdConfig,
    pub timing: TimingConfig,
    /// Turn non-2xx responses into errors
    pub fail_on_error_status: bool,
    pub retry: Option<RetryConfig>,
    /// URL prefix -> canned response
    pub stubs: HashMap<String, StubConfig>,
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Create a new client configuration builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig to allow for cleaner configuration creation
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn timeout(mut self, timeout: impl Into<String>) -> Self {
        self.config.transport.timeout = Some(timeout.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.transport.user_agent = user_agent.into();
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.headers.insert(name.into(), value.into());
        self
    }

    pub fn request_id(mut self, enabled: bool) -> Self {
        self.config.request_id.enabled = enabled;
        self
    }

    pub fn timing(mut self, enabled: bool) -> Self {
        self.config.timing.enabled = enabled;
        self
    }

    pub fn fail_on_error_status(mut self, enabled: bool) -> Self {
        self.config.fail_on_error_status = enabled;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = Some(retry);
        self
    }

    pub fn stub(mut self, prefix: impl Into<String>, stub: StubConfig) -> Self {
        self.config.stubs.insert(prefix.into(), stub);
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
