//! Named circuit breakers whose state lives in a shared key-value store.
//!
//! A breaker stops calling a dependency that keeps failing. After
//! `threshold` consecutive failures it opens and rejects every call with
//! [`ToolkitError::CircuitOpen`] until `timeout` has passed, then admits a
//! single probe: success closes it, failure reopens it with a fresh deadline.
//!
//! State is keyed by name and persisted through a [`KeyValueStore`], so
//! every process sharing the store sees the same breaker:
//!
//! | key | value |
//! |---|---|
//! | `opcache_toolkit_cb_{name}_state` | `CLOSED`, `OPEN` or `HALF_OPEN` |
//! | `opcache_toolkit_cb_{name}_failures` | consecutive failures |
//! | `opcache_toolkit_cb_{name}_next_attempt_ms` | next admission, unix milliseconds |
//!
//! Missing or unreadable values fall back to `CLOSED`, 0 and 0.
//!
//! # Examples
//!
//! ```rust
//! use opcache_toolkit_circuitbreaker::{BreakerConfig, CircuitBreaker, MemoryKeyValueStore};
//!
//! # async fn example() {
//! let breaker = CircuitBreaker::builder(MemoryKeyValueStore::new())
//!     .on_state_transition(|from, to| println!("{} -> {}", from, to))
//!     .build();
//!
//! let result = breaker
//!     .execute("warmup", &BreakerConfig::warmup(), || async {
//!         Ok::<_, std::io::Error>("warmed")
//!     })
//!     .await;
//!
//! match result {
//!     Ok(body) => println!("{}", body),
//!     Err(e) if e.is_circuit_open() => println!("temporarily disabled, retry later"),
//!     Err(e) => println!("failed: {}", e),
//! }
//! # }
//! ```
//!
//! # Concurrency
//!
//! Within one process, state updates for a name are serialized; the
//! protected operation itself runs outside that lock. Across processes the
//! store is read-modify-written without coordination, so two processes may
//! both count a failure past the threshold. Both then open the breaker, which
//! is the safe direction.
//!
//! # Feature Flags
//!
//! - `metrics`: emits `circuitbreaker_calls_total` and
//!   `circuitbreaker_transitions_total`
//! - `serde`: enables `Serialize` for [`CircuitState`] and [`BreakerState`]

mod config;
mod events;
mod layer;
mod state;
mod store;

pub use config::{BreakerConfig, BreakerConfigBuilder};
pub use events::CircuitBreakerEvent;
pub use layer::{CircuitBreakerLayer, CircuitBreakerService};
pub use state::{BreakerKeys, BreakerState, CircuitState};
pub use store::{KeyValueStore, MemoryKeyValueStore};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};
use opcache_toolkit_core::events::{EventListener, EventListeners, FnListener};
use opcache_toolkit_core::{SharedClock, SystemClock, ToolkitError};
use state::Persisted;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Instant;
#[cfg(feature = "metrics")]
use std::sync::Once;
use tokio::sync::Mutex;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Guards calls to named dependencies.
///
/// Cloning is cheap; clones share the store, clock, listeners and locks.
pub struct CircuitBreaker<K> {
    inner: Arc<Inner<K>>,
}

struct Inner<K> {
    store: K,
    clock: SharedClock,
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl<K> Clone for CircuitBreaker<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// What admission decided for one call.
enum Admission {
    Permitted(CircuitState),
    Rejected,
}

impl<K: KeyValueStore> CircuitBreaker<K> {
    /// Creates a breaker over `store` using the system clock.
    pub fn new(store: K) -> Self {
        Self::builder(store).build()
    }

    /// Creates a new builder.
    pub fn builder(store: K) -> CircuitBreakerBuilder<K> {
        CircuitBreakerBuilder::new(store)
    }

    /// Runs `operation` through the breaker called `name`.
    ///
    /// Returns [`ToolkitError::CircuitOpen`] without calling `operation` while
    /// the breaker is open. Otherwise the operation runs and its outcome is
    /// recorded; its error comes back unchanged as
    /// [`ToolkitError::OperationFailed`].
    pub async fn execute<T, E, F, Fut>(
        &self,
        name: &str,
        config: &BreakerConfig,
        operation: F,
    ) -> Result<T, ToolkitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.admit(name, config).await {
            Admission::Rejected => {
                tracing::debug!(breaker = name, "call rejected, circuit is open");
                self.inner
                    .event_listeners
                    .emit(&CircuitBreakerEvent::CallRejected {
                        name: name.to_string(),
                        timestamp: Instant::now(),
                    });

                #[cfg(feature = "metrics")]
                counter!(
                    "circuitbreaker_calls_total",
                    "circuitbreaker" => name.to_string(),
                    "outcome" => "rejected"
                )
                .increment(1);

                return Err(ToolkitError::CircuitOpen {
                    name: name.to_string(),
                });
            }
            Admission::Permitted(state) => {
                tracing::trace!(breaker = name, %state, "call permitted");
                self.inner
                    .event_listeners
                    .emit(&CircuitBreakerEvent::CallPermitted {
                        name: name.to_string(),
                        timestamp: Instant::now(),
                        state,
                    });
            }
        }

        match operation().await {
            Ok(value) => {
                self.record_success(name).await;
                Ok(value)
            }
            Err(e) => {
                self.record_failure(name, config).await;
                Err(ToolkitError::OperationFailed(e))
            }
        }
    }

    /// Reads the current state of the breaker called `name`.
    pub async fn snapshot(&self, name: &str) -> BreakerState {
        self.load(name).await.into_state(name)
    }

    /// Re-initializes the breaker called `name` to `CLOSED` with no failures.
    pub async fn reset(&self, name: &str) {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let current = self.load(name).await;
        self.save(name, &Persisted::default()).await;
        self.transitioned(name, current.state, CircuitState::Closed);
        tracing::info!(breaker = name, "circuit breaker reset");
    }

    async fn admit(&self, name: &str, config: &BreakerConfig) -> Admission {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let mut current = self.load(name).await;
        let now = self.inner.clock.now_millis();

        match current.state {
            CircuitState::Closed => Admission::Permitted(CircuitState::Closed),
            // A probe holds the half-open state until its lease expires.
            CircuitState::Open | CircuitState::HalfOpen if now < current.next_attempt_ms => {
                Admission::Rejected
            }
            from => {
                current.state = CircuitState::HalfOpen;
                current.next_attempt_ms = deadline(now, config);
                self.save(name, &current).await;
                self.transitioned(name, from, CircuitState::HalfOpen);
                Admission::Permitted(CircuitState::HalfOpen)
            }
        }
    }

    async fn record_success(&self, name: &str) {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        self.inner
            .event_listeners
            .emit(&CircuitBreakerEvent::SuccessRecorded {
                name: name.to_string(),
                timestamp: Instant::now(),
            });

        #[cfg(feature = "metrics")]
        counter!(
            "circuitbreaker_calls_total",
            "circuitbreaker" => name.to_string(),
            "outcome" => "success"
        )
        .increment(1);

        let current = self.load(name).await;
        if current == Persisted::default() {
            return;
        }
        // A call admitted before the breaker tripped cannot close it.
        if current.state == CircuitState::Open {
            tracing::debug!(breaker = name, "late success ignored, circuit is open");
            return;
        }

        self.save(name, &Persisted::default()).await;
        self.transitioned(name, current.state, CircuitState::Closed);
    }

    async fn record_failure(&self, name: &str, config: &BreakerConfig) {
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        let mut current = self.load(name).await;
        current.failures = current.failures.saturating_add(1);

        self.inner
            .event_listeners
            .emit(&CircuitBreakerEvent::FailureRecorded {
                name: name.to_string(),
                timestamp: Instant::now(),
                failure_count: current.failures,
            });

        #[cfg(feature = "metrics")]
        counter!(
            "circuitbreaker_calls_total",
            "circuitbreaker" => name.to_string(),
            "outcome" => "failure"
        )
        .increment(1);

        let from = current.state;
        let trips = from == CircuitState::HalfOpen || current.failures >= config.threshold();
        if trips {
            current.state = CircuitState::Open;
            current.next_attempt_ms = deadline(self.inner.clock.now_millis(), config);
        }
        self.save(name, &current).await;

        if trips {
            tracing::warn!(
                breaker = name,
                failures = current.failures,
                timeout_secs = config.timeout().as_secs(),
                "circuit breaker opened"
            );
            self.transitioned(name, from, CircuitState::Open);
        }
    }

    fn transitioned(&self, name: &str, from: CircuitState, to: CircuitState) {
        if from == to {
            return;
        }

        tracing::info!(breaker = name, from = %from, to = %to, "circuit state transition");

        self.inner
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                name: name.to_string(),
                timestamp: Instant::now(),
                from_state: from,
                to_state: to,
            });

        #[cfg(feature = "metrics")]
        counter!(
            "circuitbreaker_transitions_total",
            "circuitbreaker" => name.to_string(),
            "from" => from.as_str(),
            "to" => to.as_str()
        )
        .increment(1);
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .inner
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(name.to_string()).or_default())
    }

    async fn load(&self, name: &str) -> Persisted {
        let keys = BreakerKeys::for_name(name);
        let state = self
            .read(&keys.state)
            .await
            .and_then(|v| CircuitState::parse(&v))
            .unwrap_or_default();
        let failures = self
            .read(&keys.failures)
            .await
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let next_attempt_ms = self
            .read(&keys.next_attempt)
            .await
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        Persisted {
            state,
            failures,
            next_attempt_ms,
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.inner.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(key, error = %e, "failed to read circuit breaker state");
                None
            }
        }
    }

    async fn save(&self, name: &str, persisted: &Persisted) {
        let keys = BreakerKeys::for_name(name);
        let writes = [
            (keys.state, persisted.state.as_str().to_string()),
            (keys.failures, persisted.failures.to_string()),
            (keys.next_attempt, persisted.next_attempt_ms.to_string()),
        ];
        for (key, value) in writes {
            if let Err(e) = self.inner.store.set(&key, value).await {
                tracing::error!(key = %key, error = %e, "failed to write circuit breaker state");
            }
        }
    }
}

fn deadline(now_ms: i64, config: &BreakerConfig) -> i64 {
    let timeout_ms = i64::try_from(config.timeout().as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_add(timeout_ms)
}

/// Builder for [`CircuitBreaker`].
pub struct CircuitBreakerBuilder<K> {
    store: K,
    clock: SharedClock,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl<K: KeyValueStore> CircuitBreakerBuilder<K> {
    fn new(store: K) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "circuitbreaker_calls_total",
                "Total number of calls through the circuit breaker"
            );
            describe_counter!(
                "circuitbreaker_transitions_total",
                "Total number of circuit breaker state transitions"
            );
        });

        Self {
            store,
            clock: Arc::new(SystemClock),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the clock used for open deadlines.
    ///
    /// Default: [`SystemClock`]
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Registers a listener for every breaker event, e.g. an [`EventRecorder`].
    ///
    /// [`EventRecorder`]: opcache_toolkit_core::EventRecorder
    pub fn event_listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<CircuitBreakerEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Registers a callback invoked on every state change.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::StateTransition {
                from_state,
                to_state,
                ..
            } = event
            {
                f(*from_state, *to_state);
            }
        }));
        self
    }

    /// Registers a callback invoked with the breaker name when a call is rejected.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::CallRejected { name, .. } = event {
                f(name);
            }
        }));
        self
    }

    /// Registers a callback invoked with the running failure count on each failure.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::FailureRecorded { failure_count, .. } = event {
                f(*failure_count);
            }
        }));
        self
    }

    /// Builds the breaker.
    pub fn build(self) -> CircuitBreaker<K> {
        CircuitBreaker {
            inner: Arc::new(Inner {
                store: self.store,
                clock: self.clock,
                locks: StdMutex::new(HashMap::new()),
                event_listeners: self.event_listeners,
            }),
        }
    }
}
