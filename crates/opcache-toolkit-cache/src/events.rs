use opcache_toolkit_core::events::{Component, ToolkitEvent};
use std::time::Instant;

/// Events emitted by a [`TtlCache`](crate::TtlCache).
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A live entry was found.
    Hit {
        source_name: String,
        timestamp: Instant,
    },
    /// No live entry was found (absent or expired).
    Miss {
        source_name: String,
        timestamp: Instant,
    },
    /// Every entry was dropped.
    Invalidated {
        source_name: String,
        timestamp: Instant,
        /// Entries that were present when the cache was cleared.
        dropped: usize,
    },
    /// A value computed before the last invalidation was refused.
    StaleInsertRejected {
        source_name: String,
        timestamp: Instant,
    },
}

impl ToolkitEvent for CacheEvent {
    fn component(&self) -> Component {
        Component::Cache
    }

    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "cache_hit",
            CacheEvent::Miss { .. } => "cache_miss",
            CacheEvent::Invalidated { .. } => "cache_invalidated",
            CacheEvent::StaleInsertRejected { .. } => "cache_stale_insert_rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::Invalidated { timestamp, .. }
            | CacheEvent::StaleInsertRejected { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            CacheEvent::Hit { source_name, .. }
            | CacheEvent::Miss { source_name, .. }
            | CacheEvent::Invalidated { source_name, .. }
            | CacheEvent::StaleInsertRejected { source_name, .. } => source_name,
        }
    }
}
