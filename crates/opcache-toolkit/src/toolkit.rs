use crate::circuitbreaker::{CircuitBreaker, KeyValueStore};
use crate::commands::{
    AlertNotifier, AlertPolicy, Fetcher, OpcacheBackend, PreloadCommand, ResetCommand,
    SnapshotCommand, WarmupCommand,
};
use crate::core::{ConfigError, SharedClock, SystemClock};
use crate::stats::{ForecastResult, RepositoryConfig, RetentionPolicy, SampleRepository, Storage};
use std::sync::Arc;

/// The collaborators every command shares, wired once.
///
/// One backend, one breaker store and one sample repository back all of the
/// commands handed out, so breaker state and cached chart windows are
/// shared between them.
pub struct Toolkit<B, K, S> {
    backend: Arc<B>,
    breaker: CircuitBreaker<K>,
    repository: Arc<SampleRepository<S>>,
    retention: RetentionPolicy,
    alerts: AlertPolicy,
    clock: SharedClock,
}

impl<B, K, S> Toolkit<B, K, S>
where
    B: OpcacheBackend,
    K: KeyValueStore,
    S: Storage,
{
    pub fn builder(backend: B, store: K, storage: S) -> ToolkitBuilder<B, K, S> {
        ToolkitBuilder {
            backend,
            store,
            storage,
            repository: RepositoryConfig::default(),
            retention: RetentionPolicy::default(),
            alerts: AlertPolicy::default(),
            clock: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn breaker(&self) -> &CircuitBreaker<K> {
        &self.breaker
    }

    pub fn repository(&self) -> &SampleRepository<S> {
        &self.repository
    }

    pub fn preload_command(&self) -> PreloadCommand<B, K> {
        PreloadCommand::new(Arc::clone(&self.backend), self.breaker.clone())
    }

    pub fn reset_command(&self) -> ResetCommand<B, K> {
        ResetCommand::new(Arc::clone(&self.backend), self.breaker.clone())
    }

    /// Warm-up runs against a fetcher rather than the backend.
    pub fn warmup_command<F: Fetcher>(&self, fetcher: F) -> WarmupCommand<F, K> {
        WarmupCommand::new(Arc::new(fetcher), self.breaker.clone())
    }

    pub fn snapshot_command<N: AlertNotifier>(&self, notifier: N) -> SnapshotCommand<B, S, N> {
        SnapshotCommand::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.repository),
            notifier,
        )
        .retention(self.retention)
        .alerts(self.alerts)
        .clock(Arc::clone(&self.clock))
    }

    /// Forecasts wasted-memory exhaustion against the live memory figures.
    pub async fn memory_prediction(&self) -> Result<ForecastResult, B::Error> {
        let status = self.backend.status().await?;
        Ok(self
            .repository
            .get_memory_prediction(status.total_memory, status.used_memory)
            .await)
    }
}

/// Builder for [`Toolkit`].
pub struct ToolkitBuilder<B, K, S> {
    backend: B,
    store: K,
    storage: S,
    repository: RepositoryConfig,
    retention: RetentionPolicy,
    alerts: AlertPolicy,
    clock: Option<SharedClock>,
}

impl<B, K, S> ToolkitBuilder<B, K, S>
where
    B: OpcacheBackend,
    K: KeyValueStore,
    S: Storage,
{
    /// Sets the repository cache and retry settings.
    pub fn repository_config(mut self, config: RepositoryConfig) -> Self {
        self.repository = config;
        self
    }

    /// Sets how long snapshot samples are kept.
    pub fn retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Sets when snapshots raise a hit-rate alert.
    pub fn alerts(mut self, alerts: AlertPolicy) -> Self {
        self.alerts = alerts;
        self
    }

    /// Sets the clock shared by the breaker, the repository and snapshots.
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Toolkit<B, K, S>, ConfigError> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let breaker = CircuitBreaker::builder(self.store)
            .clock(Arc::clone(&clock))
            .build();
        let repository = SampleRepository::builder(self.storage)
            .config(self.repository)
            .clock(Arc::clone(&clock))
            .build()?;

        tracing::debug!(
            retention_days = self.retention.retention_days(),
            alerts = self.alerts.is_enabled(),
            "toolkit assembled"
        );

        Ok(Toolkit {
            backend: Arc::new(self.backend),
            breaker,
            repository: Arc::new(repository),
            retention: self.retention,
            alerts: self.alerts,
            clock,
        })
    }
}
