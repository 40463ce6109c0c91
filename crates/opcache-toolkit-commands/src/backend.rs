//! Capabilities the use cases call out to.

use std::future::{ready, Future};

/// A point-in-time reading of the opcode cache.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStatus {
    /// Hit rate as a percentage, 0 to 100.
    pub hit_rate: f64,
    pub cached_scripts: u64,
    pub wasted_memory: u64,
    pub used_memory: u64,
    /// Configured capacity in bytes.
    pub total_memory: u64,
}

/// The opcode cache being managed.
pub trait OpcacheBackend: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Whether the cache is loaded and answering.
    fn is_enabled(&self) -> impl Future<Output = bool> + Send;

    /// Compiles one script into the cache. `Ok(false)` means the cache
    /// declined it, e.g. because the file is missing.
    fn compile(&self, target: &str) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Clears the cache. `Ok(false)` means the reset was refused.
    fn reset(&self) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// Reads current statistics.
    fn status(&self) -> impl Future<Output = Result<CacheStatus, Self::Error>> + Send;
}

/// Issues warm-up requests.
pub trait Fetcher: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Requests `url` and returns the HTTP status code.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<u16, Self::Error>> + Send;
}

/// A hit rate below the configured threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRateAlert {
    pub hit_rate: f64,
    pub threshold: f64,
}

/// Delivers hit-rate alerts (mail, chat, pager).
///
/// Closures taking `&HitRateAlert` implement this directly.
pub trait AlertNotifier: Send + Sync + 'static {
    fn notify(&self, alert: &HitRateAlert) -> impl Future<Output = ()> + Send;
}

impl<F> AlertNotifier for F
where
    F: Fn(&HitRateAlert) + Send + Sync + 'static,
{
    fn notify(&self, alert: &HitRateAlert) -> impl Future<Output = ()> + Send {
        self(alert);
        ready(())
    }
}
