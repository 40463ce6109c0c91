//! Operator use cases built from the breaker and the sample repository.
//!
//! Every command returns a [`CommandResult`] and never an error: failures
//! from the layers below become `success: false` with the cause as message.
//! Commands take their collaborators explicitly so hosts construct them once
//! and tests substitute fakes.

mod backend;
mod preload;
mod profiler;
mod reset;
mod result;
mod snapshot;
mod warmup;

pub use backend::{AlertNotifier, CacheStatus, Fetcher, HitRateAlert, OpcacheBackend};
pub use preload::{PreloadCommand, PRELOAD_BREAKER};
pub use profiler::Profiler;
pub use reset::{ResetCommand, RESET_BREAKER};
pub use result::CommandResult;
pub use snapshot::{AlertPolicy, SnapshotCommand};
pub use warmup::{WarmupCommand, WarmupFailure, WARMUP_BREAKER};

/// Message returned when the opcode cache is not available.
pub const NOT_ENABLED: &str = "OPcache is not enabled or available on this server.";
