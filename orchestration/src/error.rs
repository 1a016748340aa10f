//! Error taxonomy for the orchestration layer.
//!
//! Endpoint-side failures always cross the boundary as `error` responses
//! and get converted into these variants on the host side; nothing in
//! this layer panics across the isolation boundary or tears down the
//! endpoint because a single request failed.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for orchestration operations.
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

/// Errors surfaced by the compilation orchestrator.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// The native compiler core failed to construct. `init()` may be
    /// retried; the orchestrator remains usable.
    #[error("compiler initialization failed: {reason}")]
    Initialization { reason: String },

    /// A compile or type-check call was made before a successful `init()`.
    /// Contract violation; no message was sent to the endpoint.
    #[error("compiler not initialized. Call init first")]
    NotInitialized,

    /// The endpoint reported a failure while compiling. Only this request
    /// fails; the endpoint and orchestrator remain usable.
    #[error("compilation failed: {message}")]
    Compilation { message: String },

    /// The request exceeded its deadline. The pending entry was removed,
    /// so a late response will be silently discarded.
    #[error("request timed out after {waited:?}")]
    Timeout { waited: Duration },

    /// Malformed, unknown, or mismatched message. Non-recoverable for the
    /// single request it concerns.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// The endpoint task or its transport channel is gone.
    #[error("compiler endpoint is no longer running")]
    EndpointUnavailable,
}

impl OrchestrationError {
    pub fn initialization(reason: impl Into<String>) -> Self {
        Self::Initialization {
            reason: reason.into(),
        }
    }

    pub fn compilation(message: impl Into<String>) -> Self {
        Self::Compilation {
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Whether retrying the same call can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Initialization { .. } | Self::Timeout { .. })
    }
}
