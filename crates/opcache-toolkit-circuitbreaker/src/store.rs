//! Key-value capability that holds breaker state between processes.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::{ready, Future};
use std::sync::{Arc, Mutex, PoisonError};

/// A string key-value store shared by every process that uses a breaker.
///
/// Reads and writes are individually atomic; nothing more is assumed.
///
/// # Examples
///
/// ```rust
/// use opcache_toolkit_circuitbreaker::KeyValueStore;
/// use std::collections::HashMap;
/// use std::convert::Infallible;
/// use std::sync::Mutex;
///
/// struct Options(Mutex<HashMap<String, String>>);
///
/// impl KeyValueStore for Options {
///     type Error = Infallible;
///
///     async fn get(&self, key: &str) -> Result<Option<String>, Infallible> {
///         Ok(self.0.lock().unwrap().get(key).cloned())
///     }
///
///     async fn set(&self, key: &str, value: String) -> Result<(), Infallible> {
///         self.0.lock().unwrap().insert(key.to_string(), value);
///         Ok(())
///     }
/// }
/// ```
pub trait KeyValueStore: Send + Sync + 'static {
    /// Error returned when the backend is unreachable.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads `key`, returning `None` if it was never written.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;

    /// Writes `value` under `key`.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

impl<K: KeyValueStore> KeyValueStore for Arc<K> {
    type Error = K::Error;

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send {
        (**self).get(key)
    }

    fn set(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        (**self).set(key, value)
    }
}

/// In-process store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a value without going through the async interface.
    pub fn value(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Writes a value without going through the async interface.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send {
        ready(Ok(self.value(key)))
    }

    fn set(
        &self,
        key: &str,
        value: String,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        self.insert(key, value);
        ready(Ok(()))
    }
}
