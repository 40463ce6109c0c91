use opcache_toolkit_core::ConfigError;
use std::time::Duration;

/// Tripping parameters for a named breaker.
///
/// A breaker opens after `threshold` consecutive failures and stays open for
/// `timeout` before admitting a probe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    threshold: u32,
    timeout: Duration,
}

impl BreakerConfig {
    /// Creates a validated configuration.
    ///
    /// A threshold of zero is rejected. A zero timeout is accepted but makes
    /// the breaker probe on every call after opening, so it is logged.
    pub fn new(threshold: u32, timeout: Duration) -> Result<Self, ConfigError> {
        if threshold == 0 {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        if timeout.is_zero() {
            tracing::warn!(
                threshold,
                "circuit breaker timeout is zero; an open breaker will probe on every call"
            );
        }
        Ok(Self { threshold, timeout })
    }

    /// Creates a new builder.
    pub fn builder() -> BreakerConfigBuilder {
        BreakerConfigBuilder::new()
    }

    /// Preset for bulk script compilation: 10 failures, 5 minutes open.
    pub fn preload() -> Self {
        Self {
            threshold: 10,
            timeout: Duration::from_secs(300),
        }
    }

    /// Preset for warming remote URLs: 3 failures, 5 minutes open.
    pub fn warmup() -> Self {
        Self {
            threshold: 3,
            timeout: Duration::from_secs(300),
        }
    }

    /// Consecutive failures that open the breaker.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// How long the breaker stays open before a probe is admitted.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Builder for [`BreakerConfig`].
#[derive(Debug, Clone)]
pub struct BreakerConfigBuilder {
    threshold: u32,
    timeout: Duration,
}

impl Default for BreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakerConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - threshold: 5
    /// - timeout: 60s
    pub fn new() -> Self {
        let defaults = BreakerConfig::default();
        Self {
            threshold: defaults.threshold,
            timeout: defaults.timeout,
        }
    }

    /// Sets the number of consecutive failures that open the breaker.
    pub fn threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets how long the breaker stays open.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<BreakerConfig, ConfigError> {
        BreakerConfig::new(self.threshold, self.timeout)
    }
}
