//! Resilience, health history and forecasting for PHP OPcache management.
//!
//! `opcache-toolkit` bundles the building blocks behind one dependency. Each
//! block is also a standalone crate:
//!
//! - **Circuit breaker** (`circuitbreaker` feature): named breakers whose
//!   state is shared through a key-value store
//! - **Retry** (`retry` feature): bounded attempts with exponential backoff
//! - **Cache** (`cache` feature): TTL + LRU memoization with invalidation
//! - **Stats** (`stats` feature): health sample repository and exhaustion
//!   forecasting
//! - **Commands** (`commands` feature): preload, reset, warm-up and snapshot
//!   use cases, plus [`Toolkit`] to wire them once
//!
//! ```toml
//! [dependencies]
//! opcache-toolkit = { version = "0.1", features = ["full"] }
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "commands")]
//! # {
//! use opcache_toolkit::circuitbreaker::MemoryKeyValueStore;
//! use opcache_toolkit::commands::{CacheStatus, OpcacheBackend};
//! use opcache_toolkit::stats::MemoryStorage;
//! use opcache_toolkit::Toolkit;
//! use std::convert::Infallible;
//!
//! struct Local;
//!
//! impl OpcacheBackend for Local {
//!     type Error = Infallible;
//!     async fn is_enabled(&self) -> bool { true }
//!     async fn compile(&self, _target: &str) -> Result<bool, Infallible> { Ok(true) }
//!     async fn reset(&self) -> Result<bool, Infallible> { Ok(true) }
//!     async fn status(&self) -> Result<CacheStatus, Infallible> {
//!         Ok(CacheStatus {
//!             hit_rate: 98.5,
//!             cached_scripts: 1_200,
//!             wasted_memory: 2_097_152,
//!             used_memory: 64_000_000,
//!             total_memory: 134_217_728,
//!         })
//!     }
//! }
//!
//! # async fn example() {
//! let toolkit = Toolkit::builder(Local, MemoryKeyValueStore::new(), MemoryStorage::new())
//!     .build()
//!     .unwrap();
//!
//! let preloaded = toolkit.preload_command().execute(&["/srv/app/index.php"]).await;
//! println!("{}", preloaded.message);
//! # }
//! # }
//! ```

// Re-export core (always available)
pub use opcache_toolkit_core as core;

#[cfg(feature = "cache")]
pub use opcache_toolkit_cache as cache;

#[cfg(feature = "circuitbreaker")]
pub use opcache_toolkit_circuitbreaker as circuitbreaker;

#[cfg(feature = "commands")]
pub use opcache_toolkit_commands as commands;

#[cfg(feature = "retry")]
pub use opcache_toolkit_retry as retry;

#[cfg(feature = "stats")]
pub use opcache_toolkit_stats as stats;

#[cfg(feature = "commands")]
mod toolkit;

#[cfg(feature = "commands")]
pub use toolkit::{Toolkit, ToolkitBuilder};
