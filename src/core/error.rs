use std::{any::Any, sync::Arc};

use thiserror::Error;

use crate::ports::http_client::HttpClientError;

/// Failure captured while running the interceptor chain.
///
/// Errors are stored inside the envelopes while the chain drains, so the
/// type is cheaply cloneable.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum InterceptorError {
    /// The transport (or the response transformer wrapping it) failed
    #[error(transparent)]
    Transport(#[from] HttpClientError),

    /// A hook reported a failure
    #[error("Interceptor '{interceptor}' failed: {message}")]
    Hook {
        /// Name of the interceptor that failed
        interceptor: String,
        /// Human readable failure description
        message: String,
    },

    /// A hook panicked while it was being polled
    #[error("Interceptor at step {index} panicked: {message}")]
    Panicked {
        /// Zero based position of the interceptor in the chain
        index: usize,
        /// Panic payload, when it was a string
        message: String,
    },

    /// The request was short circuited but no handler produced a response
    #[error("Short circuit was triggered, but no short circuit handlers generated any response")]
    UnresolvedShortCircuit,

    /// The chain finished without a response and without an error
    #[error("Response is empty")]
    EmptyResponse,

    /// Any other error raised by interceptor code
    #[error("{0}")]
    Other(Arc<dyn std::error::Error + Send + Sync>),
}

impl InterceptorError {
    /// Build a [`InterceptorError::Hook`] error.
    pub fn hook(interceptor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            interceptor: interceptor.into(),
            message: message.into(),
        }
    }

    /// Wrap an arbitrary error.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other(Arc::new(err))
    }

    pub(crate) fn from_panic(index: usize, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { index, message }
    }

    /// Returns the transport error, if this failure came from the wire call.
    pub fn as_transport(&self) -> Option<&HttpClientError> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for chain operations
pub type InterceptorResult<T> = Result<T, InterceptorError>;
