use chrono::{DateTime, Duration as ChronoDuration, Utc};
use opcache_toolkit_core::ConfigError;
use opcache_toolkit_retry::RetryPolicy;
use std::time::Duration;

/// Settings for a [`SampleRepository`](crate::SampleRepository).
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryConfig {
    pub(crate) cache_ttl: Duration,
    pub(crate) cache_capacity: usize,
    pub(crate) retry: RetryPolicy,
    pub(crate) prediction_window: usize,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 16,
            retry: RetryPolicy::storage(),
            prediction_window: 30,
        }
    }
}

impl RepositoryConfig {
    /// Creates a new builder.
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::new()
    }

    /// How long a chart window is served from cache.
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Maximum number of distinct chart windows cached at once.
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    /// Policy applied to every storage call.
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Number of recent samples fed to the forecast.
    pub fn prediction_window(&self) -> usize {
        self.prediction_window
    }
}

/// Builder for [`RepositoryConfig`].
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    config: RepositoryConfig,
}

impl RepositoryConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - cache_ttl: 300s
    /// - cache_capacity: 16
    /// - retry: [`RetryPolicy::storage`]
    /// - prediction_window: 30
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn prediction_window(mut self, samples: usize) -> Self {
        self.config.prediction_window = samples;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<RepositoryConfig, ConfigError> {
        if self.config.cache_capacity == 0 {
            return Err(ConfigError::InvalidCapacity(0));
        }
        Ok(self.config)
    }
}

/// How long samples are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { days: 90 }
    }
}

impl RetentionPolicy {
    /// Keeps samples for `days` days.
    pub fn days(days: u32) -> Self {
        Self { days }
    }

    /// Retention period in days.
    pub fn retention_days(&self) -> u32 {
        self.days
    }

    /// Samples recorded before the returned instant are expired.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        cutoff(now, self.days)
    }
}

pub(crate) fn cutoff(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now.checked_sub_signed(ChronoDuration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
