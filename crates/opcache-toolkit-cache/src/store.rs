//! LRU storage with TTL tracking and an invalidation generation.

use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

/// Entry in the cache with TTL tracking.
#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

/// Outcome of a generation-checked insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertOutcome {
    Stored,
    Stale,
}

pub(crate) struct CacheStore<K, V> {
    entries: LruCache<K, CacheEntry<V>>,
    ttl: Duration,
    generation: u64,
}

impl<K: Hash + Eq, V: Clone> CacheStore<K, V> {
    pub(crate) fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: LruCache::new(capacity),
            ttl,
            generation: 0,
        }
    }

    /// Gets a value if it exists and has not expired; expired entries are dropped.
    pub(crate) fn get(&mut self, key: &K) -> Option<V> {
        let expired = self.entries.get(key)?.is_expired(self.ttl);
        if expired {
            self.entries.pop(key);
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Stores `value` only if no invalidation happened since `generation` was read.
    pub(crate) fn insert_at(&mut self, key: K, value: V, generation: u64) -> InsertOutcome {
        if generation != self.generation {
            return InsertOutcome::Stale;
        }
        self.entries.put(key, CacheEntry::new(value));
        InsertOutcome::Stored
    }

    /// Drops every entry and starts a new generation. Returns the number dropped.
    pub(crate) fn invalidate(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
        dropped
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
