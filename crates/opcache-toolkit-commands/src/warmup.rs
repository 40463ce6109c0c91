use crate::{CommandResult, Fetcher, Profiler};
use opcache_toolkit_circuitbreaker::{BreakerConfig, CircuitBreaker, KeyValueStore};
use opcache_toolkit_core::ToolkitError;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Breaker name used by [`WarmupCommand`].
pub const WARMUP_BREAKER: &str = "warmup";

/// Why one warm-up request counted as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WarmupFailure {
    #[error("HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(String),
}

/// Requests each URL once so the scripts behind it get compiled.
///
/// Failures are collected per URL and never fail the command; an open
/// breaker stops the remaining requests.
pub struct WarmupCommand<F, K> {
    fetcher: Arc<F>,
    breaker: CircuitBreaker<K>,
    config: BreakerConfig,
}

impl<F: Fetcher, K: KeyValueStore> WarmupCommand<F, K> {
    /// Creates the command with the warm-up breaker preset.
    pub fn new(fetcher: Arc<F>, breaker: CircuitBreaker<K>) -> Self {
        Self::with_config(fetcher, breaker, BreakerConfig::warmup())
    }

    pub fn with_config(fetcher: Arc<F>, breaker: CircuitBreaker<K>, config: BreakerConfig) -> Self {
        Self {
            fetcher,
            breaker,
            config,
        }
    }

    pub async fn execute<T: AsRef<str>>(&self, urls: &[T]) -> CommandResult {
        let profiler = Profiler::start("warmup");
        let mut success_count = 0u64;
        let mut errors = Map::new();

        for url in urls {
            let url = url.as_ref();
            let outcome = self
                .breaker
                .execute(WARMUP_BREAKER, &self.config, || self.fetch(url))
                .await;

            match outcome {
                Ok(()) => success_count += 1,
                Err(e) => {
                    let stop = matches!(e, ToolkitError::CircuitOpen { .. });
                    errors.insert(url.to_string(), Value::String(e.to_string()));
                    if stop {
                        tracing::warn!(url, "warm-up stopped, circuit is open");
                        break;
                    }
                }
            }
        }

        let error_count = errors.len();
        let data = json!({
            "successCount": success_count,
            "errors": errors,
        });
        profiler.finish(&json!({ "successCount": success_count, "errorCount": error_count }));

        CommandResult::success(format!("Warmed up {} URLs.", success_count), data)
    }

    async fn fetch(&self, url: &str) -> Result<(), WarmupFailure> {
        match self.fetcher.fetch(url).await {
            Ok(200) => Ok(()),
            Ok(status) => Err(WarmupFailure::Status(status)),
            Err(e) => Err(WarmupFailure::Transport(e.to_string())),
        }
    }
}
