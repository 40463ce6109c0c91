use crate::{CommandResult, OpcacheBackend, Profiler, NOT_ENABLED};
use opcache_toolkit_circuitbreaker::{BreakerConfig, CircuitBreaker, KeyValueStore};
use opcache_toolkit_core::ToolkitError;
use serde_json::json;
use std::sync::Arc;

/// Breaker name used by [`PreloadCommand`].
pub const PRELOAD_BREAKER: &str = "preload";

/// Compiles a list of scripts into the cache.
///
/// Each compile runs through the `preload` breaker. A script the cache
/// declines or a compile that errors is recorded in `failedTargets` and the
/// batch continues; an open breaker stops the batch.
pub struct PreloadCommand<B, K> {
    backend: Arc<B>,
    breaker: CircuitBreaker<K>,
    config: BreakerConfig,
}

impl<B: OpcacheBackend, K: KeyValueStore> PreloadCommand<B, K> {
    /// Creates the command with the preload breaker preset.
    pub fn new(backend: Arc<B>, breaker: CircuitBreaker<K>) -> Self {
        Self::with_config(backend, breaker, BreakerConfig::preload())
    }

    pub fn with_config(backend: Arc<B>, breaker: CircuitBreaker<K>, config: BreakerConfig) -> Self {
        Self {
            backend,
            breaker,
            config,
        }
    }

    pub async fn execute<T: AsRef<str>>(&self, targets: &[T]) -> CommandResult {
        if !self.backend.is_enabled().await {
            return CommandResult::failure(NOT_ENABLED);
        }

        let profiler = Profiler::start("preload");
        let mut compiled_count = 0u64;
        let mut failed_targets = Vec::new();
        let mut open_circuit = None;

        for target in targets {
            let target = target.as_ref();
            let backend = &self.backend;
            let outcome = self
                .breaker
                .execute(PRELOAD_BREAKER, &self.config, move || backend.compile(target))
                .await;

            match outcome {
                Ok(true) => compiled_count += 1,
                Ok(false) => failed_targets.push(target.to_string()),
                Err(e @ ToolkitError::CircuitOpen { .. }) => {
                    tracing::warn!(script = target, "preload stopped, circuit is open");
                    open_circuit = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    tracing::warn!(script = target, error = %e, "compile failed");
                    failed_targets.push(target.to_string());
                }
            }
        }

        let data = json!({
            "compiledCount": compiled_count,
            "failedTargets": failed_targets,
        });
        profiler.finish(&data);

        match open_circuit {
            Some(message) => CommandResult::failure_with(message, data),
            None => CommandResult::success(
                format!("Successfully preloaded {} files into OPcache.", compiled_count),
                data,
            ),
        }
    }
}
