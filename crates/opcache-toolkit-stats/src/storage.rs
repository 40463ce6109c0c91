//! Storage capability for health samples.

use crate::HealthSample;
use chrono::{DateTime, Utc};
use std::future::{ready, Future};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// A single append-mostly table of samples keyed by `recorded_at`.
///
/// Implementations are assumed reliable but slow; the repository retries
/// every call.
pub trait Storage: Send + Sync + 'static {
    /// Error returned when the backend fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The `limit` most recent samples, oldest first.
    fn select_recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<HealthSample>, Self::Error>> + Send;

    /// Every sample, oldest first.
    fn select_all(&self) -> impl Future<Output = Result<Vec<HealthSample>, Self::Error>> + Send;

    /// Appends one sample.
    fn insert(&self, sample: &HealthSample)
        -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Removes samples recorded strictly before `cutoff`, returning how many.
    fn delete_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// Removes every sample.
    fn truncate(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Error produced by [`MemoryStorage`] when a failure is injected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("storage unavailable: {0}")]
pub struct StorageUnavailable(pub String);

/// In-process storage with call counters and failure injection.
///
/// Clones share the same rows, counters and injected failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    rows: Arc<Mutex<Vec<HealthSample>>>,
    failures_left: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls fail, whatever they are.
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Number of select calls made, including failed ones.
    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of insert, delete and truncate calls made, including failed ones.
    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of rows held.
    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn rows(&self) -> MutexGuard<'_, Vec<HealthSample>> {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, op: &str) -> Result<(), StorageUnavailable> {
        let injected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StorageUnavailable(format!("{} failed", op)));
        }
        Ok(())
    }

    fn sorted(&self) -> Vec<HealthSample> {
        let mut rows = self.rows().clone();
        rows.sort_by_key(|s| s.recorded_at);
        rows
    }
}

impl Storage for MemoryStorage {
    type Error = StorageUnavailable;

    fn select_recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<HealthSample>, Self::Error>> + Send {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let result = self.check("select").map(|()| {
            let rows = self.sorted();
            let skip = rows.len().saturating_sub(limit);
            rows.into_iter().skip(skip).collect()
        });
        ready(result)
    }

    fn select_all(&self) -> impl Future<Output = Result<Vec<HealthSample>, Self::Error>> + Send {
        self.reads.fetch_add(1, Ordering::SeqCst);
        ready(self.check("select").map(|()| self.sorted()))
    }

    fn insert(
        &self,
        sample: &HealthSample,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let result = self.check("insert").map(|()| self.rows().push(sample.clone()));
        ready(result)
    }

    fn delete_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, Self::Error>> + Send {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let result = self.check("delete").map(|()| {
            let mut rows = self.rows();
            let before = rows.len();
            rows.retain(|s| s.recorded_at >= cutoff);
            (before - rows.len()) as u64
        });
        ready(result)
    }

    fn truncate(&self) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let result = self.check("truncate").map(|()| self.rows().clear());
        ready(result)
    }
}
