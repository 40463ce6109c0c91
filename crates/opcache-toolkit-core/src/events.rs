//! Event system shared by the breaker, retry executor and cache.
//!
//! Every event names the [`Component`] that raised it and the instance it
//! belongs to (a breaker name, a retry executor name, a cache name). Events
//! that mean the protected dependency is unhealthy report
//! [`ToolkitEvent::is_degraded`], so a host can route a tripped breaker and
//! exhausted storage retries to one alert sink without matching on each
//! component's event enum.
//!
//! [`EventRecorder`] keeps the most recent events in memory for status
//! pages and tests.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// The part of the toolkit that raised an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    CircuitBreaker,
    Retry,
    Cache,
}

impl Component {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::CircuitBreaker => "circuitbreaker",
            Component::Retry => "retry",
            Component::Cache => "cache",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for events emitted by toolkit components.
pub trait ToolkitEvent: Send + Sync + fmt::Debug {
    /// The component that emitted this event.
    fn component(&self) -> Component;

    /// Returns the kind of event (e.g., "state_transition", "call_rejected").
    fn event_type(&self) -> &'static str;

    /// Returns when this event occurred.
    fn timestamp(&self) -> Instant;

    /// The breaker, executor or cache name this event belongs to.
    fn source_name(&self) -> &str;

    /// Whether this event reports the protected dependency as unhealthy.
    fn is_degraded(&self) -> bool {
        false
    }
}

/// Trait for listening to toolkit events.
pub trait EventListener<E: ToolkitEvent>: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &E);
}

/// Type alias for shared event listeners.
pub type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// The listeners registered on one component.
#[derive(Clone)]
pub struct EventListeners<E: ToolkitEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: ToolkitEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Delivers `event` to every listener.
    ///
    /// A panicking listener is logged and skipped; the remaining listeners
    /// still receive the event.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
            if outcome.is_err() {
                tracing::warn!(
                    component = %event.component(),
                    source = event.source_name(),
                    event = event.event_type(),
                    "event listener panicked"
                );
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: ToolkitEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ToolkitEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

/// A closure-backed event listener.
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _phantom: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: ToolkitEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}

/// Keeps the last `capacity` events seen.
///
/// Clones share one buffer: register a clone as a listener and read the
/// events back through the original.
///
/// ```
/// use opcache_toolkit_core::{Component, EventRecorder, ToolkitEvent};
/// # #[derive(Debug, Clone)]
/// # struct Tripped;
/// # impl ToolkitEvent for Tripped {
/// #     fn component(&self) -> Component { Component::CircuitBreaker }
/// #     fn event_type(&self) -> &'static str { "state_transition" }
/// #     fn timestamp(&self) -> std::time::Instant { std::time::Instant::now() }
/// #     fn source_name(&self) -> &str { "preload" }
/// #     fn is_degraded(&self) -> bool { true }
/// # }
///
/// let recorder = EventRecorder::with_capacity(2);
/// for _ in 0..3 {
///     recorder.record(&Tripped);
/// }
/// assert_eq!(recorder.events().len(), 2);
/// assert_eq!(recorder.degraded().len(), 2);
/// ```
#[derive(Debug)]
pub struct EventRecorder<E> {
    events: Arc<Mutex<VecDeque<E>>>,
    capacity: usize,
}

impl<E> Clone for EventRecorder<E> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
            capacity: self.capacity,
        }
    }
}

impl<E: ToolkitEvent + Clone> EventRecorder<E> {
    /// Keeps at most `capacity` events; a capacity of 0 is raised to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<E>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, event: &E) {
        let mut events = self.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }

    /// Recorded events, oldest first.
    pub fn events(&self) -> Vec<E> {
        self.lock().iter().cloned().collect()
    }

    /// Recorded events that report a degraded dependency.
    pub fn degraded(&self) -> Vec<E> {
        self.lock().iter().filter(|e| e.is_degraded()).cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl<E: ToolkitEvent + Clone> EventListener<E> for EventRecorder<E> {
    fn on_event(&self, event: &E) {
        self.record(event);
    }
}
