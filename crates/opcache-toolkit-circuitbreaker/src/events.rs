use crate::CircuitState;
use opcache_toolkit_core::events::{Component, ToolkitEvent};
use std::time::Instant;

/// Events emitted by a [`CircuitBreaker`](crate::CircuitBreaker).
///
/// `name` is the breaker name passed to `execute`. A transition to `OPEN`
/// and a rejected call count as degraded.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The breaker moved between states.
    StateTransition {
        name: String,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    /// A call was admitted.
    CallPermitted {
        name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call was rejected without running the operation.
    CallRejected {
        name: String,
        timestamp: Instant,
    },
    /// An admitted call succeeded.
    SuccessRecorded {
        name: String,
        timestamp: Instant,
    },
    /// An admitted call failed.
    FailureRecorded {
        name: String,
        timestamp: Instant,
        failure_count: u32,
    },
}

impl ToolkitEvent for CircuitBreakerEvent {
    fn component(&self) -> Component {
        Component::CircuitBreaker
    }

    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { name, .. }
            | CircuitBreakerEvent::CallPermitted { name, .. }
            | CircuitBreakerEvent::CallRejected { name, .. }
            | CircuitBreakerEvent::SuccessRecorded { name, .. }
            | CircuitBreakerEvent::FailureRecorded { name, .. } => name,
        }
    }

    fn is_degraded(&self) -> bool {
        matches!(
            self,
            CircuitBreakerEvent::StateTransition {
                to_state: CircuitState::Open,
                ..
            } | CircuitBreakerEvent::CallRejected { .. }
        )
    }
}
