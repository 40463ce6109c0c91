use opcache_toolkit_core::ConfigError;
use std::time::Duration;

/// How many times to attempt an operation and how long to wait in between.
///
/// The wait before attempt `n + 2` is `base_delay * backoff_multiplier^n`, so
/// the storage policy (3 attempts, 100ms, ×2) waits 100ms and then 200ms.
/// Policies are immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
    backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Creates a validated policy.
    pub fn new(
        max_attempts: usize,
        base_delay: Duration,
        backoff_multiplier: f64,
    ) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(max_attempts));
        }
        if !backoff_multiplier.is_finite() || backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidMultiplier(backoff_multiplier));
        }
        Ok(Self {
            max_attempts,
            base_delay,
            backoff_multiplier,
        })
    }

    /// Creates a new policy builder.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// The policy used for sample storage: 3 attempts, 100ms base, doubling.
    pub fn storage() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Total attempts, including the first.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Delay before the second attempt.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Growth factor applied to each subsequent delay.
    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Returns the delay to sleep after the failed attempt with index `attempt`
    /// (0 for the first attempt).
    pub fn next_backoff(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let factor = self.backoff_multiplier.powi(exponent);
        let nanos = (self.base_delay.as_nanos() as f64 * factor).round();
        if !nanos.is_finite() || nanos >= u64::MAX as f64 {
            return Duration::MAX;
        }
        Duration::from_nanos(nanos as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::storage()
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_attempts: usize,
    base_delay: Duration,
    backoff_multiplier: f64,
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicyBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_attempts: 3
    /// - base_delay: 100ms
    /// - backoff_multiplier: 2.0
    pub fn new() -> Self {
        let defaults = RetryPolicy::storage();
        Self {
            max_attempts: defaults.max_attempts,
            base_delay: defaults.base_delay,
            backoff_multiplier: defaults.backoff_multiplier,
        }
    }

    /// Sets the total number of attempts.
    ///
    /// This includes the initial attempt, so max_attempts=3 means
    /// 1 initial attempt + 2 retries.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay before the first retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the factor each subsequent delay grows by.
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Validates and builds the policy.
    pub fn build(self) -> Result<RetryPolicy, ConfigError> {
        RetryPolicy::new(self.max_attempts, self.base_delay, self.backoff_multiplier)
    }
}
