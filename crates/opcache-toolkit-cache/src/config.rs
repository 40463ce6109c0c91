//! Configuration for [`TtlCache`](crate::TtlCache).

use crate::events::CacheEvent;
use crate::TtlCache;
use opcache_toolkit_core::{ConfigError, EventListener, EventListeners, FnListener};
use std::hash::Hash;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::time::Duration;

/// Builder for configuring and constructing a [`TtlCache`].
pub struct TtlCacheBuilder<K, V> {
    capacity: usize,
    ttl: Duration,
    name: String,
    event_listeners: EventListeners<CacheEvent>,
    _entries: PhantomData<fn() -> (K, V)>,
}

impl<K, V> TtlCacheBuilder<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            capacity: 16,
            ttl: Duration::from_secs(300),
            name: String::from("<unnamed>"),
            event_listeners: EventListeners::new(),
            _entries: PhantomData,
        }
    }

    /// Sets the maximum number of entries.
    ///
    /// Default: 16
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets how long an entry stays valid after it is stored.
    ///
    /// Default: 300 seconds
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the name of this cache instance for observability.
    ///
    /// Default: `"<unnamed>"`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a listener for every cache event.
    pub fn event_listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<CacheEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Registers a callback invoked on a cache hit.
    pub fn on_hit<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::Hit { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback invoked on a cache miss.
    pub fn on_miss<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if matches!(event, CacheEvent::Miss { .. }) {
                f();
            }
        }));
        self
    }

    /// Registers a callback invoked whenever the cache is cleared, with the
    /// number of entries dropped.
    pub fn on_invalidate<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CacheEvent::Invalidated { dropped, .. } = event {
                f(*dropped);
            }
        }));
        self
    }

    /// Builds the cache.
    pub fn build(self) -> Result<TtlCache<K, V>, ConfigError> {
        let capacity =
            NonZeroUsize::new(self.capacity).ok_or(ConfigError::InvalidCapacity(self.capacity))?;
        Ok(TtlCache::from_parts(
            capacity,
            self.ttl,
            self.name,
            self.event_listeners,
        ))
    }
}

impl<K, V> Default for TtlCacheBuilder<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
