//! Bounded retry with exponential backoff.
//!
//! [`RetryExecutor`] runs a fallible async operation up to
//! [`RetryPolicy::max_attempts`] times, sleeping
//! `base_delay * backoff_multiplier^n` between attempts. When every attempt
//! fails the last error comes back wrapped in
//! [`ToolkitError::RetryExhausted`].
//!
//! # Examples
//!
//! ```
//! use opcache_toolkit_retry::{RetryExecutor, RetryPolicy};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! # async fn example() {
//! let calls = &AtomicUsize::new(0);
//! let executor = RetryExecutor::builder()
//!     .name("stats-db")
//!     .on_retry(|attempt, delay| println!("retry {} after {:?}", attempt, delay))
//!     .build();
//!
//! let value = executor
//!     .run(&RetryPolicy::storage(), move || async move {
//!         if calls.fetch_add(1, Ordering::SeqCst) < 2 {
//!             Err("deadlock")
//!         } else {
//!             Ok(42)
//!         }
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(value, 42);
//! # }
//! ```
//!
//! Sleeps never hold a lock and block only the calling task. Callers that need
//! a deadline either drop the future or use
//! [`RetryExecutor::run_cancellable`].

mod config;
mod events;

pub use config::{RetryPolicy, RetryPolicyBuilder};
pub use events::RetryEvent;

#[cfg(feature = "metrics")]
use metrics::counter;
use opcache_toolkit_core::events::{EventListener, EventListeners, FnListener};
use opcache_toolkit_core::{Cancellation, ToolkitError};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

/// Runs operations under a [`RetryPolicy`].
///
/// The executor carries only a name and listeners; the policy is supplied per
/// call so each call site can choose its own.
#[derive(Clone, Debug)]
pub struct RetryExecutor {
    name: String,
    event_listeners: EventListeners<RetryEvent>,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutor {
    /// Creates an unnamed executor with no listeners.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new builder.
    pub fn builder() -> RetryExecutorBuilder {
        RetryExecutorBuilder::new()
    }

    /// The name used in logs and events.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `operation` until it succeeds or the policy's attempts run out.
    pub async fn run<T, E, F, Fut>(
        &self,
        policy: &RetryPolicy,
        operation: F,
    ) -> Result<T, ToolkitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.run_inner(policy, operation, None).await
    }

    /// Like [`run`](Self::run), but stops with [`ToolkitError::Cancelled`] once
    /// `cancellation` fires.
    ///
    /// Cancellation is checked before every attempt and raced against each
    /// backoff sleep. An attempt that has already started runs to completion.
    pub async fn run_cancellable<T, E, F, Fut>(
        &self,
        policy: &RetryPolicy,
        operation: F,
        cancellation: &Cancellation,
    ) -> Result<T, ToolkitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.run_inner(policy, operation, Some(cancellation)).await
    }

    async fn run_inner<T, E, F, Fut>(
        &self,
        policy: &RetryPolicy,
        mut operation: F,
        cancellation: Option<&Cancellation>,
    ) -> Result<T, ToolkitError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut attempt = 0;

        loop {
            if cancellation.is_some_and(Cancellation::is_cancelled) {
                return Err(self.cancelled(attempt));
            }

            match operation().await {
                Ok(value) => {
                    self.event_listeners.emit(&RetryEvent::Success {
                        source_name: self.name.clone(),
                        timestamp: Instant::now(),
                        attempts: attempt + 1,
                    });

                    #[cfg(feature = "metrics")]
                    counter!(
                        "retry_calls_total",
                        "retry" => self.name.clone(),
                        "outcome" => "success"
                    )
                    .increment(1);

                    return Ok(value);
                }
                Err(error) => {
                    let attempts = attempt + 1;

                    if attempts >= policy.max_attempts() {
                        tracing::warn!(
                            retry = %self.name,
                            attempts,
                            error = %error,
                            "retries exhausted"
                        );
                        self.event_listeners.emit(&RetryEvent::Exhausted {
                            source_name: self.name.clone(),
                            timestamp: Instant::now(),
                            attempts,
                        });

                        #[cfg(feature = "metrics")]
                        counter!("retry_exhausted_total", "retry" => self.name.clone())
                            .increment(1);

                        return Err(ToolkitError::RetryExhausted {
                            attempts,
                            source: error,
                        });
                    }

                    let delay = policy.next_backoff(attempt);
                    tracing::warn!(
                        retry = %self.name,
                        attempt = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "attempt failed, backing off"
                    );
                    self.event_listeners.emit(&RetryEvent::Retry {
                        source_name: self.name.clone(),
                        timestamp: Instant::now(),
                        attempt: attempts,
                        delay,
                    });

                    #[cfg(feature = "metrics")]
                    counter!("retry_attempts_total", "retry" => self.name.clone()).increment(1);

                    if !Self::sleep(delay, cancellation).await {
                        return Err(self.cancelled(attempts));
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Sleeps for `delay`; returns `false` if cancelled first.
    async fn sleep(delay: Duration, cancellation: Option<&Cancellation>) -> bool {
        match cancellation {
            Some(cancellation) => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => true,
                    _ = cancellation.cancelled() => false,
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }

    fn cancelled<E>(&self, attempts: usize) -> ToolkitError<E> {
        tracing::debug!(retry = %self.name, attempts, "retry cancelled");
        self.event_listeners.emit(&RetryEvent::Cancelled {
            source_name: self.name.clone(),
            timestamp: Instant::now(),
            attempts,
        });
        ToolkitError::Cancelled
    }
}

/// Builder for [`RetryExecutor`].
pub struct RetryExecutorBuilder {
    name: String,
    event_listeners: EventListeners<RetryEvent>,
}

impl Default for RetryExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            name: "<unnamed>".to_string(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the name used in logs and events.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a listener for every retry event.
    pub fn event_listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<RetryEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Registers a callback invoked after a failed attempt, before the delay.
    ///
    /// # Callback Signature
    /// `Fn(usize, Duration)`: the number of the attempt that failed (1 = the
    /// initial attempt) and the delay before the next one.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback invoked on success with the total attempts made.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback invoked when every attempt has failed.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Builds the executor.
    pub fn build(self) -> RetryExecutor {
        RetryExecutor {
            name: self.name,
            event_listeners: self.event_listeners,
        }
    }
}
