//! Bounded TTL cache for derived read models.
//!
//! [`TtlCache`] keeps up to `capacity` values for at most `ttl` each and can
//! be cleared as a whole. It is built for read-through caching of values that
//! are expensive to derive from a slow backend:
//!
//! ```
//! use opcache_toolkit_cache::TtlCache;
//! use std::time::Duration;
//!
//! let cache: TtlCache<u32, Vec<u64>> = TtlCache::builder()
//!     .name("chart-windows")
//!     .ttl(Duration::from_secs(300))
//!     .build()
//!     .unwrap();
//!
//! // A reader notes the generation before going to the backend...
//! let generation = cache.generation();
//! let window = vec![1, 2, 3];
//! // ...and a concurrent write invalidates in the meantime.
//! cache.invalidate_all();
//!
//! // The value read before the write is not cached.
//! assert!(!cache.insert_if_current(30, window, generation));
//! assert_eq!(cache.get(&30), None);
//! ```
//!
//! Lookups and inserts are best-effort: two readers may both miss and both
//! populate. Invalidation is not: once [`TtlCache::invalidate_all`] returns,
//! no value computed before it can be served.

mod config;
mod events;
mod store;

pub use config::TtlCacheBuilder;
pub use events::CacheEvent;

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use opcache_toolkit_core::EventListeners;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use store::{CacheStore, InsertOutcome};

/// A thread-safe LRU cache whose entries expire after a fixed TTL.
pub struct TtlCache<K, V> {
    store: Mutex<CacheStore<K, V>>,
    ttl: Duration,
    name: String,
    event_listeners: EventListeners<CacheEvent>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    /// Creates a new builder.
    pub fn builder() -> TtlCacheBuilder<K, V> {
        TtlCacheBuilder::new()
    }

    pub(crate) fn from_parts(
        capacity: NonZeroUsize,
        ttl: Duration,
        name: String,
        event_listeners: EventListeners<CacheEvent>,
    ) -> Self {
        Self {
            store: Mutex::new(CacheStore::new(capacity, ttl)),
            ttl,
            name,
            event_listeners,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheStore<K, V>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a live value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        let value = self.lock().get(key);

        let event = match value {
            Some(_) => CacheEvent::Hit {
                source_name: self.name.clone(),
                timestamp: Instant::now(),
            },
            None => CacheEvent::Miss {
                source_name: self.name.clone(),
                timestamp: Instant::now(),
            },
        };
        self.event_listeners.emit(&event);

        #[cfg(feature = "metrics")]
        counter!(
            "cache_requests_total",
            "cache" => self.name.clone(),
            "result" => if value.is_some() { "hit" } else { "miss" }
        )
        .increment(1);

        value
    }

    /// The current invalidation generation.
    ///
    /// Read it before computing a value and pass it to
    /// [`insert_if_current`](Self::insert_if_current).
    pub fn generation(&self) -> u64 {
        self.lock().generation()
    }

    /// Stores `value` unless the cache was invalidated after `generation` was read.
    ///
    /// Returns `true` if the value was stored.
    pub fn insert_if_current(&self, key: K, value: V, generation: u64) -> bool {
        let outcome = {
            let mut store = self.lock();
            let outcome = store.insert_at(key, value, generation);

            #[cfg(feature = "metrics")]
            gauge!("cache_size", "cache" => self.name.clone()).set(store.len() as f64);

            outcome
        };

        if outcome == InsertOutcome::Stale {
            tracing::debug!(cache = %self.name, "discarding value computed before invalidation");
            self.event_listeners.emit(&CacheEvent::StaleInsertRejected {
                source_name: self.name.clone(),
                timestamp: Instant::now(),
            });
            return false;
        }
        true
    }

    /// Stores `value` unconditionally.
    pub fn insert(&self, key: K, value: V) {
        let mut store = self.lock();
        let generation = store.generation();
        store.insert_at(key, value, generation);
    }

    /// Drops every entry. Values computed before this call will not be stored.
    pub fn invalidate_all(&self) {
        let dropped = self.lock().invalidate();
        tracing::debug!(cache = %self.name, dropped, "cache invalidated");

        self.event_listeners.emit(&CacheEvent::Invalidated {
            source_name: self.name.clone(),
            timestamp: Instant::now(),
            dropped,
        });

        #[cfg(feature = "metrics")]
        {
            counter!("cache_invalidations_total", "cache" => self.name.clone()).increment(1);
            gauge!("cache_size", "cache" => self.name.clone()).set(0.0);
        }
    }

    /// Number of entries currently held, including expired ones not yet dropped.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if no entries are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The name used in logs and events.
    pub fn name(&self) -> &str {
        &self.name
    }
}
