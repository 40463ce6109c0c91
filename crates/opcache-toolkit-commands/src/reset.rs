use crate::{CommandResult, OpcacheBackend, Profiler, NOT_ENABLED};
use opcache_toolkit_circuitbreaker::{BreakerConfig, CircuitBreaker, KeyValueStore};
use serde_json::json;
use std::sync::Arc;

/// Breaker name used by [`ResetCommand`].
pub const RESET_BREAKER: &str = "reset";

/// Clears the opcode cache through the `reset` breaker.
pub struct ResetCommand<B, K> {
    backend: Arc<B>,
    breaker: CircuitBreaker<K>,
    config: BreakerConfig,
}

impl<B: OpcacheBackend, K: KeyValueStore> ResetCommand<B, K> {
    pub fn new(backend: Arc<B>, breaker: CircuitBreaker<K>) -> Self {
        Self::with_config(backend, breaker, BreakerConfig::default())
    }

    pub fn with_config(backend: Arc<B>, breaker: CircuitBreaker<K>, config: BreakerConfig) -> Self {
        Self {
            backend,
            breaker,
            config,
        }
    }

    pub async fn execute(&self) -> CommandResult {
        if !self.backend.is_enabled().await {
            return CommandResult::failure(NOT_ENABLED);
        }

        let profiler = Profiler::start("reset");
        let backend = &self.backend;
        let outcome = self
            .breaker
            .execute(RESET_BREAKER, &self.config, move || backend.reset())
            .await;

        let result = match outcome {
            Ok(true) => CommandResult::success("OPcache has been successfully reset.", json!({})),
            Ok(false) => CommandResult::failure(
                "Failed to reset OPcache. This may be due to restrictive server settings.",
            ),
            Err(e) => {
                tracing::error!(error = %e, code = e.code(), "reset failed");
                CommandResult::failure(e.to_string())
            }
        };
        profiler.finish(&json!({ "success": result.success }));
        result
    }
}
