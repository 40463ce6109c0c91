//! Linear exhaustion forecast over wasted-memory samples.
//!
//! The model is deliberately crude: growth is `(last - first) / count`, and
//! the remaining headroom divided by that growth is reported as days. The
//! "days" unit only holds when samples are taken once per day; the predictor
//! has no way to check that and does not try.

use serde::Serialize;

/// Severity of a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastStatus {
    /// Fewer than two samples.
    InsufficientData,
    /// No growth, or exhaustion is far off.
    Stable,
    /// Exhaustion within the warning horizon.
    Warning,
    /// Exhaustion within the critical horizon, or already past it.
    Critical,
}

impl ForecastStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastStatus::InsufficientData => "insufficient_data",
            ForecastStatus::Stable => "stable",
            ForecastStatus::Warning => "warning",
            ForecastStatus::Critical => "critical",
        }
    }
}

/// Outcome of [`TrendPredictor::predict`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub status: ForecastStatus,
    /// Samples until exhaustion. Present for warning and critical only; zero
    /// or negative means the capacity is already exceeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    /// Average wasted-memory growth per sample, in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_per_sample: Option<f64>,
}

impl ForecastResult {
    fn insufficient() -> Self {
        Self {
            status: ForecastStatus::InsufficientData,
            days_remaining: None,
            growth_per_sample: None,
        }
    }
}

/// Classifies wasted-memory growth against the remaining capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendPredictor {
    critical_days: i64,
    warning_days: i64,
}

impl Default for TrendPredictor {
    fn default() -> Self {
        Self {
            critical_days: 7,
            warning_days: 30,
        }
    }
}

impl TrendPredictor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forecasts from `wasted` (oldest first) given the total capacity and
    /// the bytes currently in use.
    pub fn predict(&self, wasted: &[u64], total_capacity: u64, used: u64) -> ForecastResult {
        let (first, last) = match wasted {
            [first, .., last] => (*first as f64, *last as f64),
            _ => return ForecastResult::insufficient(),
        };

        let growth = (last - first) / wasted.len() as f64;
        if growth <= 0.0 {
            return ForecastResult {
                status: ForecastStatus::Stable,
                days_remaining: None,
                growth_per_sample: Some(growth),
            };
        }

        let remaining = total_capacity as f64 - used as f64;
        let days = (remaining / growth).floor() as i64;

        let status = if days < self.critical_days {
            ForecastStatus::Critical
        } else if days < self.warning_days {
            ForecastStatus::Warning
        } else {
            ForecastStatus::Stable
        };

        ForecastResult {
            status,
            days_remaining: (status != ForecastStatus::Stable).then_some(days),
            growth_per_sample: Some(growth),
        }
    }
}
