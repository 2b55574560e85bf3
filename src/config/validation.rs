use http::{HeaderName, HeaderValue, StatusCode};
use tracing_subscriber::EnvFilter;

use crate::config::models::{ClientConfig, RetryConfig, StubConfig, TransportConfig};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Upper bound for retry attempts; anything above is almost certainly a typo
const MAX_RETRIES_LIMIT: u32 = 10;

/// Client configuration validator
pub struct ClientConfigValidator;

impl ClientConfigValidator {
    /// Validate the entire client configuration, reporting every problem at once
    pub fn validate(config: &ClientConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(mut transport_errors) = Self::validate_transport(&config.transport) {
            errors.append(&mut transport_errors);
        }

        for (name, value) in &config.headers {
            if let Err(e) = Self::validate_header(name, value) {
                errors.push(e);
            }
        }

        if config.request_id.enabled && HeaderName::try_from(config.request_id.header.as_str()).is_err() {
            errors.push(ValidationError::InvalidHeader {
                name: config.request_id.header.clone(),
                reason: "request_id.header is not a valid header name".to_string(),
            });
        }

        if let Some(retry) = &config.retry {
            if let Err(mut retry_errors) = Self::validate_retry(retry) {
                errors.append(&mut retry_errors);
            }
        }

        for (prefix, stub) in &config.stubs {
            if let Err(mut stub_errors) = Self::validate_stub(prefix, stub) {
                errors.append(&mut stub_errors);
            }
        }

        if EnvFilter::try_new(&config.logging.level).is_err() {
            errors.push(ValidationError::InvalidField {
                field: "logging.level".to_string(),
                message: format!("'{}' is not a valid log filter", config.logging.level),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    fn validate_transport(transport: &TransportConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(timeout) = &transport.timeout {
            match humantime::parse_duration(timeout) {
                Ok(duration) if duration.is_zero() => errors.push(ValidationError::InvalidField {
                    field: "transport.timeout".to_string(),
                    message: "Timeout must be greater than zero".to_string(),
                }),
                Ok(_) => {}
                Err(e) => errors.push(ValidationError::InvalidField {
                    field: "transport.timeout".to_string(),
                    message: format!("'{timeout}' is not a valid duration: {e}"),
                }),
            }
        }

        if transport.user_agent.trim().is_empty() {
            errors.push(ValidationError::MissingField {
                field: "transport.user_agent".to_string(),
            });
        } else if HeaderValue::from_str(&transport.user_agent).is_err() {
            errors.push(ValidationError::InvalidHeader {
                name: "user-agent".to_string(),
                reason: "transport.user_agent contains characters not allowed in a header value"
                    .to_string(),
            });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validate_header(name: &str, value: &str) -> ValidationResult<()> {
        if HeaderName::try_from(name).is_err() {
            return Err(ValidationError::InvalidHeader {
                name: name.to_string(),
                reason: "not a valid header name".to_string(),
            });
        }
        if HeaderValue::from_str(value).is_err() {
            return Err(ValidationError::InvalidHeader {
                name: name.to_string(),
                reason: "value contains characters not allowed in a header".to_string(),
            });
        }
        Ok(())
    }

    fn validate_retry(retry: &RetryConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if retry.max_retries > MAX_RETRIES_LIMIT {
            errors.push(ValidationError::InvalidField {
                field: "retry.max_retries".to_string(),
                message: format!("At most {MAX_RETRIES_LIMIT} retries are allowed"),
            });
        }

        if retry.base_delay_ms > retry.max_delay_ms {
            errors.push(ValidationError::InvalidField {
                field: "retry.base_delay_ms".to_string(),
                message: format!(
                    "base_delay_ms ({}) must not exceed max_delay_ms ({})",
                    retry.base_delay_ms, retry.max_delay_ms
                ),
            });
        }

        for status in &retry.retry_on_status {
            if StatusCode::from_u16(*status).is_err() {
                errors.push(ValidationError::InvalidField {
                    field: "retry.retry_on_status".to_string(),
                    message: format!("{status} is not a valid HTTP status code"),
                });
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validate_stub(prefix: &str, stub: &StubConfig) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !(prefix.starts_with("http://") || prefix.starts_with("https://")) {
            errors.push(ValidationError::InvalidField {
                field: format!("stub '{prefix}'"),
                message: "Stub prefixes must be absolute http:// or https:// URLs".to_string(),
            });
        } else if url::Url::parse(prefix).is_err() {
            errors.push(ValidationError::InvalidField {
                field: format!("stub '{prefix}'"),
                message: "Stub prefix is not a valid URL".to_string(),
            });
        }

        if StatusCode::from_u16(stub.status).is_err() {
            errors.push(ValidationError::InvalidField {
                field: format!("stub '{prefix}' status"),
                message: format!("{} is not a valid HTTP status code", stub.status),
            });
        }

        if let Some(content_type) = &stub.content_type {
            if HeaderValue::from_str(content_type).is_err() {
                errors.push(ValidationError::InvalidHeader {
                    name: "content-type".to_string(),
                    reason: format!("stub '{prefix}' content_type is not a valid header value"),
                });
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}
