use crate::{AlertNotifier, CommandResult, HitRateAlert, OpcacheBackend, Profiler, NOT_ENABLED};
use opcache_toolkit_core::{SharedClock, SystemClock};
use opcache_toolkit_stats::{HealthSample, RetentionPolicy, SampleRepository, Storage};
use serde_json::json;
use std::sync::Arc;

/// When a low hit rate raises an alert.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPolicy {
    enabled: bool,
    hit_rate_threshold: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            hit_rate_threshold: 90.0,
        }
    }
}

impl AlertPolicy {
    /// Never alerts.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Alerts when the hit rate drops strictly below `threshold` percent.
    pub fn below(threshold: f64) -> Self {
        Self {
            enabled: true,
            hit_rate_threshold: threshold,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn hit_rate_threshold(&self) -> f64 {
        self.hit_rate_threshold
    }

    fn check(&self, hit_rate: f64) -> Option<HitRateAlert> {
        (self.enabled && hit_rate < self.hit_rate_threshold).then_some(HitRateAlert {
            hit_rate,
            threshold: self.hit_rate_threshold,
        })
    }
}

/// The periodic job: record one sample, prune old ones, check the hit rate.
pub struct SnapshotCommand<B, S, N> {
    backend: Arc<B>,
    repository: Arc<SampleRepository<S>>,
    notifier: N,
    retention: RetentionPolicy,
    alerts: AlertPolicy,
    clock: SharedClock,
}

impl<B, S, N> SnapshotCommand<B, S, N>
where
    B: OpcacheBackend,
    S: Storage,
    N: AlertNotifier,
{
    pub fn new(backend: Arc<B>, repository: Arc<SampleRepository<S>>, notifier: N) -> Self {
        Self {
            backend,
            repository,
            notifier,
            retention: RetentionPolicy::default(),
            alerts: AlertPolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn alerts(mut self, alerts: AlertPolicy) -> Self {
        self.alerts = alerts;
        self
    }

    /// Sets the clock that stamps samples.
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn execute(&self) -> CommandResult {
        if !self.backend.is_enabled().await {
            return CommandResult::failure(NOT_ENABLED);
        }

        let profiler = Profiler::start("snapshot");
        let status = match self.backend.status().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = %e, "snapshot skipped, status unavailable");
                return CommandResult::failure(format!("Invalid OPcache status: {}", e));
            }
        };

        let sample = HealthSample::new(
            self.clock.now(),
            status.hit_rate,
            status.cached_scripts,
            status.wasted_memory,
        );
        let inserted = self.repository.insert(&sample).await;

        let pruned = self
            .repository
            .delete_older_than(self.retention.retention_days())
            .await
            .unwrap_or(0);

        let alert = self.alerts.check(status.hit_rate);
        if let Some(alert) = &alert {
            tracing::warn!(
                hit_rate = alert.hit_rate,
                threshold = alert.threshold,
                "hit rate below alert threshold"
            );
            self.notifier.notify(alert).await;
        }

        let data = json!({
            "inserted": inserted,
            "pruned": pruned,
            "alertTriggered": alert.is_some(),
        });
        profiler.finish(&data);

        CommandResult::success("Daily OPcache stats logged.", data)
    }
}
