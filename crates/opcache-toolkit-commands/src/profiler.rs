use serde_json::Value;
use std::time::{Duration, Instant};

/// Times one use case and logs its duration with its outcome.
#[derive(Debug)]
pub struct Profiler {
    operation: &'static str,
    started: Instant,
}

impl Profiler {
    pub fn start(operation: &'static str) -> Self {
        tracing::trace!(operation, "started");
        Self {
            operation,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Logs at debug level with `elapsed_ms` and the outcome counters.
    pub fn finish(self, outcome: &Value) -> Duration {
        let elapsed = self.elapsed();
        tracing::debug!(
            operation = self.operation,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            outcome = %outcome,
            "finished"
        );
        elapsed
    }
}
