use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// Represents the state of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum CircuitState {
    /// Calls pass through and failures are counted.
    #[default]
    Closed,
    /// Calls are rejected until the retry deadline passes.
    Open,
    /// A single probe call decides whether the breaker closes or reopens.
    HalfOpen,
}

impl CircuitState {
    /// The persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }

    /// Parses the persisted representation. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CLOSED" => Some(CircuitState::Closed),
            "OPEN" => Some(CircuitState::Open),
            "HALF_OPEN" => Some(CircuitState::HalfOpen),
            _ => None,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of a named breaker, as read from the key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct BreakerState {
    /// Name of the protected resource.
    pub name: String,
    /// Current state.
    pub state: CircuitState,
    /// Consecutive failures recorded since the breaker last closed.
    pub failure_count: u32,
    /// When the next call may be admitted. Set while open or probing.
    pub next_attempt_at: Option<DateTime<Utc>>,
}

/// The raw fields stored per breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Persisted {
    pub(crate) state: CircuitState,
    pub(crate) failures: u32,
    /// Unix milliseconds; 0 means unset.
    pub(crate) next_attempt_ms: i64,
}

impl Persisted {
    pub(crate) fn into_state(self, name: &str) -> BreakerState {
        let next_attempt_at = if self.next_attempt_ms > 0 {
            Utc.timestamp_millis_opt(self.next_attempt_ms).single()
        } else {
            None
        };
        BreakerState {
            name: name.to_string(),
            state: self.state,
            failure_count: self.failures,
            next_attempt_at,
        }
    }
}

/// Storage keys for one breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerKeys {
    /// Holds `CLOSED`, `OPEN` or `HALF_OPEN`.
    pub state: String,
    /// Holds the consecutive failure count.
    pub failures: String,
    /// Holds the next admission time in unix milliseconds. The `_ms` suffix
    /// keeps it apart from stores that hold the deadline in seconds.
    pub next_attempt: String,
}

impl BreakerKeys {
    /// Prefix shared by every breaker key.
    pub const PREFIX: &'static str = "opcache_toolkit_cb_";

    /// Keys for the breaker called `name`.
    pub fn for_name(name: &str) -> Self {
        Self {
            state: format!("{}{}_state", Self::PREFIX, name),
            failures: format!("{}{}_failures", Self::PREFIX, name),
            next_attempt: format!("{}{}_next_attempt_ms", Self::PREFIX, name),
        }
    }
}
