//! Persisted cache-health samples, chart projections and exhaustion forecasts.
//!
//! [`SampleRepository`] wraps a [`Storage`] backend with bounded retry and a
//! TTL cache of [`ChartWindow`]s. [`TrendPredictor`] turns the recent
//! wasted-memory series into a [`ForecastResult`].
//!
//! ```
//! use chrono::Utc;
//! use opcache_toolkit_stats::{HealthSample, MemoryStorage, SampleRepository};
//!
//! # async fn example() {
//! let repository = SampleRepository::builder(MemoryStorage::new()).build().unwrap();
//!
//! repository
//!     .insert(&HealthSample::new(Utc::now(), 99.2, 1_830, 4_194_304))
//!     .await;
//!
//! let window = repository.get_chart_data(30).await;
//! println!("{}", serde_json::to_string(&window).unwrap());
//!
//! let forecast = repository.get_memory_prediction(134_217_728, 96_000_000).await;
//! println!("{:?}", forecast.status);
//! # }
//! ```

mod config;
mod forecast;
mod repository;
mod sample;
mod storage;

pub use config::{RepositoryConfig, RepositoryConfigBuilder, RetentionPolicy};
pub use forecast::{ForecastResult, ForecastStatus, TrendPredictor};
pub use repository::{ExportError, SampleRepository, SampleRepositoryBuilder, DEFAULT_CHART_LIMIT};
pub use sample::{ChartWindow, HealthSample, LABEL_FORMAT};
pub use storage::{MemoryStorage, Storage, StorageUnavailable};
