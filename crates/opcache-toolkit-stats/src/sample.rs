use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Format used for [`ChartWindow`] labels.
pub const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One periodic reading of cache health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSample {
    /// When the reading was taken. Supplied by the caller.
    pub recorded_at: DateTime<Utc>,
    /// Hit rate as a percentage, 0 to 100.
    pub hit_rate: f64,
    /// Number of scripts held in the cache.
    pub cached_scripts: u64,
    /// Bytes occupied by invalidated scripts.
    pub wasted_memory_bytes: u64,
}

impl HealthSample {
    /// Creates a sample.
    pub fn new(
        recorded_at: DateTime<Utc>,
        hit_rate: f64,
        cached_scripts: u64,
        wasted_memory_bytes: u64,
    ) -> Self {
        Self {
            recorded_at,
            hit_rate,
            cached_scripts,
            wasted_memory_bytes,
        }
    }
}

/// Chart-ready projection of samples, oldest first, as four parallel series.
///
/// Serializes as `{"labels": [..], "hitRate": [..], "cached": [..], "wasted": [..]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartWindow {
    pub labels: Vec<String>,
    #[serde(rename = "hitRate")]
    pub hit_rate: Vec<f64>,
    pub cached: Vec<u64>,
    pub wasted: Vec<u64>,
}

impl ChartWindow {
    /// A window with no points.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a window from samples already ordered oldest first.
    pub fn from_samples(samples: &[HealthSample]) -> Self {
        let mut window = Self {
            labels: Vec::with_capacity(samples.len()),
            hit_rate: Vec::with_capacity(samples.len()),
            cached: Vec::with_capacity(samples.len()),
            wasted: Vec::with_capacity(samples.len()),
        };
        for sample in samples {
            window
                .labels
                .push(sample.recorded_at.format(LABEL_FORMAT).to_string());
            window.hit_rate.push(sample.hit_rate);
            window.cached.push(sample.cached_scripts);
            window.wasted.push(sample.wasted_memory_bytes);
        }
        window
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
