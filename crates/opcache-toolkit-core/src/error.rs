//! Error taxonomy shared by every toolkit component.
//!
//! Protected calls fail in one of a small number of ways, and callers need to
//! tell them apart without matching on message text:
//!
//! ```rust
//! use opcache_toolkit_core::ToolkitError;
//!
//! fn describe(err: &ToolkitError<std::io::Error>) -> &'static str {
//!     match err {
//!         ToolkitError::CircuitOpen { .. } => "temporarily disabled, retry later",
//!         ToolkitError::RetryExhausted { .. } => "backend unavailable",
//!         ToolkitError::OperationFailed(_) => "operation failed",
//!         ToolkitError::Cancelled => "cancelled",
//!     }
//! }
//!
//! let err: ToolkitError<std::io::Error> = ToolkitError::CircuitOpen { name: "preload".into() };
//! assert_eq!(describe(&err), "temporarily disabled, retry later");
//! assert_eq!(err.code(), "circuit_open");
//! ```

use std::fmt;
use thiserror::Error;

/// The error returned by breaker- and retry-protected calls.
///
/// # Type Parameters
///
/// - `E`: the error type of the protected operation
#[derive(Debug, Clone)]
pub enum ToolkitError<E> {
    /// The breaker rejected the call without invoking the operation.
    CircuitOpen {
        /// Name of the breaker that rejected the call.
        name: String,
    },

    /// Every attempt failed; carries the error from the final attempt.
    RetryExhausted {
        /// Total attempts made, including the first.
        attempts: usize,
        /// The last error observed.
        source: E,
    },

    /// The protected operation itself failed; the error is passed through unchanged.
    OperationFailed(E),

    /// The caller cancelled the call between attempts.
    Cancelled,
}

impl<E> ToolkitError<E> {
    /// Stable identifier for this kind of failure.
    ///
    /// Presentation layers key their messages off this value.
    pub fn code(&self) -> &'static str {
        match self {
            ToolkitError::CircuitOpen { .. } => "circuit_open",
            ToolkitError::RetryExhausted { .. } => "retry_exhausted",
            ToolkitError::OperationFailed(_) => "operation_failed",
            ToolkitError::Cancelled => "cancelled",
        }
    }

    /// Returns `true` if a breaker rejected the call.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ToolkitError::CircuitOpen { .. })
    }

    /// Returns `true` if retries were exhausted.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, ToolkitError::RetryExhausted { .. })
    }

    /// Returns `true` if the wrapped operation failed.
    pub fn is_operation_failed(&self) -> bool {
        matches!(self, ToolkitError::OperationFailed(_))
    }

    /// Returns `true` if the call was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ToolkitError::Cancelled)
    }

    /// Extracts the operation's error, whether it failed once or exhausted retries.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            ToolkitError::OperationFailed(e) => Some(e),
            ToolkitError::RetryExhausted { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Maps the operation error with `f`, keeping the variant.
    pub fn map_operation<F, T>(self, f: F) -> ToolkitError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            ToolkitError::CircuitOpen { name } => ToolkitError::CircuitOpen { name },
            ToolkitError::RetryExhausted { attempts, source } => ToolkitError::RetryExhausted {
                attempts,
                source: f(source),
            },
            ToolkitError::OperationFailed(e) => ToolkitError::OperationFailed(f(e)),
            ToolkitError::Cancelled => ToolkitError::Cancelled,
        }
    }
}

impl<E> fmt::Display for ToolkitError<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolkitError::CircuitOpen { name } => {
                write!(f, "circuit breaker for {} is OPEN", name)
            }
            ToolkitError::RetryExhausted { attempts, source } => {
                write!(f, "operation failed after {} attempts: {}", attempts, source)
            }
            ToolkitError::OperationFailed(e) => write!(f, "{}", e),
            ToolkitError::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl<E> std::error::Error for ToolkitError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolkitError::RetryExhausted { source, .. } => Some(source),
            ToolkitError::OperationFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// Invalid component configuration, reported by builders.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A breaker needs at least one failure to open.
    #[error("failure threshold must be at least 1, got {0}")]
    InvalidThreshold(u32),

    /// A retry policy needs at least one attempt.
    #[error("max attempts must be at least 1, got {0}")]
    InvalidMaxAttempts(usize),

    /// Backoff must not shrink between attempts.
    #[error("backoff multiplier must be a finite number >= 1.0, got {0}")]
    InvalidMultiplier(f64),

    /// A cache must hold at least one entry.
    #[error("capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),

    /// A breaker name is used as a storage key and cannot be empty.
    #[error("name must not be empty")]
    EmptyName,
}
