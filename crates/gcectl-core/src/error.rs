//! Unified error handling for gcectl-core
//!
//! Provider HTTP statuses are translated into error kinds exactly once, in
//! [`CoreError::from_status`]. Workflows discriminate on kinds through the
//! helper predicates and never look at status codes.
//!
//! # Example
//!
//! ```rust
//! use gcectl_core::CoreError;
//!
//! let err = CoreError::from_status(404, "The resource 'snap-a' was not found");
//! assert!(err.is_not_found());
//!
//! let err = CoreError::from_status(503, "backend unavailable");
//! assert!(err.is_retryable());
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::compute::OperationErrorDetail;

/// Core error type for control-plane calls and workflows
#[derive(Error, Debug)]
pub enum CoreError {
    /// Resource absent (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource already exists on creation (409)
    #[error("Resource already exists: {0}")]
    Conflict(String),

    /// Operation reached DONE carrying a provider-reported error
    #[error("Operation {operation} failed: {detail}")]
    OperationFailed {
        operation: String,
        detail: OperationErrorDetail,
    },

    /// Operation did not reach DONE before the deadline
    #[error("Operation {operation} timed out after {timeout:?}")]
    OperationTimedOut { operation: String, timeout: Duration },

    /// Wait was cancelled before the operation finished
    #[error("Wait for {0} was cancelled")]
    Cancelled(String),

    /// Network, rate-limit or 5xx failure
    #[error("Transient provider error: {0}")]
    Transient(String),

    /// Any other provider rejection (400, 401, 403, ...)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Provider answered with a body we could not interpret
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Malformed request or missing required input
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Map a non-success HTTP status and provider message to an error kind
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => CoreError::NotFound(message),
            409 => CoreError::Conflict(message),
            408 | 429 | 500..=599 => CoreError::Transient(format!("HTTP {}: {}", status, message)),
            _ => CoreError::Api { status, message },
        }
    }

    /// Returns true if this is a "not found" error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }

    /// Returns true if the resource already existed
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::Conflict(_))
    }

    /// Returns true if this is an authentication/authorization error (401/403)
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CoreError::Api { status: 401 | 403, .. })
    }

    /// Returns true if a submitted operation finished with an error
    #[must_use]
    pub fn is_operation_failed(&self) -> bool {
        matches!(self, CoreError::OperationFailed { .. })
    }

    /// Returns true if a wait ran past its deadline
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, CoreError::OperationTimedOut { .. })
    }

    /// Returns true if a wait was cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled(_))
    }

    /// Returns true if the same call may succeed when repeated
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Transient(_))
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            CoreError::Transient(err.to_string())
        } else if err.is_decode() {
            CoreError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            CoreError::from_status(status.as_u16(), err.to_string())
        } else {
            CoreError::Transient(err.to_string())
        }
    }
}

impl From<crate::config::ConfigError> for CoreError {
    fn from(err: crate::config::ConfigError) -> Self {
        CoreError::Configuration(err.to_string())
    }
}
