use crate::config::cutoff;
use crate::{
    ChartWindow, ForecastResult, HealthSample, RepositoryConfig, Storage, TrendPredictor,
};
#[cfg(feature = "metrics")]
use metrics::counter;
use opcache_toolkit_cache::TtlCache;
use opcache_toolkit_core::{ConfigError, SharedClock, SystemClock, ToolkitError};
use opcache_toolkit_retry::RetryExecutor;
use std::sync::Arc;
use thiserror::Error;

/// Number of samples returned by a chart request that does not pick a limit.
pub const DEFAULT_CHART_LIMIT: usize = 180;

/// Error returned by [`SampleRepository::export_json`].
#[derive(Debug, Error)]
pub enum ExportError<E: std::error::Error + 'static> {
    #[error("failed to read samples: {0}")]
    Storage(#[source] ToolkitError<E>),
    #[error("failed to serialize samples: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The only way in and out of persisted health samples.
///
/// Every storage call runs under the configured [`RetryPolicy`]. Chart reads
/// are cached per limit and every mutation clears all cached windows. Read
/// and write failures degrade to empty results and `false` so periodic jobs
/// keep running.
///
/// [`RetryPolicy`]: opcache_toolkit_retry::RetryPolicy
pub struct SampleRepository<S> {
    storage: S,
    config: RepositoryConfig,
    retry: RetryExecutor,
    cache: TtlCache<usize, ChartWindow>,
    clock: SharedClock,
    predictor: TrendPredictor,
}

impl<S: Storage> SampleRepository<S> {
    /// Creates a new builder with default settings.
    pub fn builder(storage: S) -> SampleRepositoryBuilder<S> {
        SampleRepositoryBuilder {
            storage,
            config: RepositoryConfig::default(),
            retry: None,
            clock: None,
        }
    }

    /// The underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The settings in use.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Stores one sample. Returns `false` if every attempt failed.
    pub async fn insert(&self, sample: &HealthSample) -> bool {
        let storage = &self.storage;
        let result = self
            .retry
            .run(&self.config.retry, move || storage.insert(sample))
            .await;

        // An attempt may have landed before it reported failure.
        self.cache.invalidate_all();

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    recorded_at = %sample.recorded_at,
                    "failed to insert health sample"
                );
                self.fallback("insert");
                false
            }
        }
    }

    /// Up to `limit` most recent samples, oldest first.
    ///
    /// Served from cache within the TTL. If storage cannot be read the
    /// window is empty and nothing is cached.
    pub async fn get_chart_data(&self, limit: usize) -> ChartWindow {
        let generation = self.cache.generation();
        if let Some(window) = self.cache.get(&limit) {
            return window;
        }

        let storage = &self.storage;
        let result = self
            .retry
            .run(&self.config.retry, move || storage.select_recent(limit))
            .await;

        match result {
            Ok(rows) => {
                let window = ChartWindow::from_samples(&rows);
                self.cache.insert_if_current(limit, window.clone(), generation);
                window
            }
            Err(e) => {
                tracing::error!(error = %e, limit, "failed to read chart data");
                self.fallback("chart");
                ChartWindow::empty()
            }
        }
    }

    /// Deletes samples recorded more than `days` days ago and returns how many.
    pub async fn delete_older_than(&self, days: u32) -> Result<u64, ToolkitError<S::Error>> {
        let before = cutoff(self.clock.now(), days);
        let storage = &self.storage;
        let result = self
            .retry
            .run(&self.config.retry, move || storage.delete_older_than(before))
            .await;

        match &result {
            Ok(0) => {}
            Ok(deleted) => {
                tracing::debug!(deleted, days, "pruned health samples");
                self.cache.invalidate_all();
            }
            Err(e) => {
                tracing::error!(error = %e, days, "failed to prune health samples");
                self.cache.invalidate_all();
            }
        }
        result
    }

    /// Removes every sample. The cache is cleared whatever the outcome.
    pub async fn truncate(&self) -> bool {
        let storage = &self.storage;
        let result = self
            .retry
            .run(&self.config.retry, move || storage.truncate())
            .await;

        self.cache.invalidate_all();

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "failed to truncate health samples");
                self.fallback("truncate");
                false
            }
        }
    }

    /// Every sample, oldest first. Never cached.
    pub async fn get_all(&self) -> Result<Vec<HealthSample>, ToolkitError<S::Error>> {
        let storage = &self.storage;
        self.retry
            .run(&self.config.retry, move || storage.select_all())
            .await
    }

    /// Every sample as a JSON array.
    pub async fn export_json(&self) -> Result<String, ExportError<S::Error>> {
        let samples = self.get_all().await.map_err(ExportError::Storage)?;
        Ok(serde_json::to_string(&samples)?)
    }

    /// Forecasts wasted-memory exhaustion from the most recent samples.
    pub async fn get_memory_prediction(&self, total_capacity: u64, used: u64) -> ForecastResult {
        let window = self.get_chart_data(self.config.prediction_window).await;
        self.predictor.predict(&window.wasted, total_capacity, used)
    }

    fn fallback(&self, operation: &'static str) {
        #[cfg(feature = "metrics")]
        counter!("stats_repository_fallbacks_total", "operation" => operation).increment(1);
        #[cfg(not(feature = "metrics"))]
        let _ = operation;
    }
}

/// Builder for [`SampleRepository`].
pub struct SampleRepositoryBuilder<S> {
    storage: S,
    config: RepositoryConfig,
    retry: Option<RetryExecutor>,
    clock: Option<SharedClock>,
}

impl<S: Storage> SampleRepositoryBuilder<S> {
    /// Sets the repository settings.
    pub fn config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the executor used for storage retries, e.g. one with listeners.
    pub fn retry_executor(mut self, executor: RetryExecutor) -> Self {
        self.retry = Some(executor);
        self
    }

    /// Sets the clock used for retention cutoffs.
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the repository.
    pub fn build(self) -> Result<SampleRepository<S>, ConfigError> {
        let cache = TtlCache::builder()
            .name("chart-windows")
            .capacity(self.config.cache_capacity)
            .ttl(self.config.cache_ttl)
            .build()?;
        Ok(SampleRepository {
            storage: self.storage,
            retry: self
                .retry
                .unwrap_or_else(|| RetryExecutor::builder().name("stats-storage").build()),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            config: self.config,
            cache,
            predictor: TrendPredictor::new(),
        })
    }
}
