use opcache_toolkit_core::events::{Component, ToolkitEvent};
use std::time::{Duration, Instant};

/// Events emitted by the retry executor.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// An attempt failed and another is about to be made after `delay`.
    Retry {
        source_name: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
    },
    /// The operation succeeded (either on first try or after retries).
    Success {
        source_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// Every attempt failed.
    Exhausted {
        source_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The caller cancelled before the next attempt.
    Cancelled {
        source_name: String,
        timestamp: Instant,
        attempts: usize,
    },
}

impl ToolkitEvent for RetryEvent {
    fn component(&self) -> Component {
        Component::Retry
    }

    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Exhausted { .. } => "exhausted",
            RetryEvent::Cancelled { .. } => "cancelled",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::Cancelled { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            RetryEvent::Retry { source_name, .. }
            | RetryEvent::Success { source_name, .. }
            | RetryEvent::Exhausted { source_name, .. }
            | RetryEvent::Cancelled { source_name, .. } => source_name,
        }
    }

    fn is_degraded(&self) -> bool {
        matches!(self, RetryEvent::Exhausted { .. })
    }
}
