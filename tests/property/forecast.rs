//! Invariants tested:
//! - Fewer than two samples never yields a classification
//! - Non-increasing series are always stable
//! - days_remaining is present exactly for warning and critical

use opcache_toolkit_stats::{ForecastStatus, TrendPredictor};
use proptest::prelude::*;

proptest! {
    #[test]
    fn short_series_is_insufficient(
        series in prop::collection::vec(any::<u32>(), 0..2),
        total in any::<u32>(),
        used in any::<u32>(),
    ) {
        let series: Vec<u64> = series.into_iter().map(u64::from).collect();
        let result = TrendPredictor::new().predict(&series, total.into(), used.into());
        prop_assert_eq!(result.status, ForecastStatus::InsufficientData);
        prop_assert_eq!(result.days_remaining, None);
        prop_assert_eq!(result.growth_per_sample, None);
    }

    #[test]
    fn non_increasing_series_is_stable(
        mut series in prop::collection::vec(0u64..1_000_000, 2..50),
        used in 0u64..1_000_000,
    ) {
        series.sort_unstable_by(|a, b| b.cmp(a));
        let result = TrendPredictor::new().predict(&series, 1_000_000, used);
        prop_assert_eq!(result.status, ForecastStatus::Stable);
        prop_assert_eq!(result.days_remaining, None);
        prop_assert!(result.growth_per_sample.unwrap() <= 0.0);
    }

    #[test]
    fn days_remaining_matches_status(
        series in prop::collection::vec(0u64..10_000_000, 2..50),
        total in 0u64..100_000_000,
        used in 0u64..100_000_000,
    ) {
        let result = TrendPredictor::new().predict(&series, total, used);
        match result.status {
            ForecastStatus::Warning => {
                let days = result.days_remaining.unwrap();
                prop_assert!((7..30).contains(&days));
            }
            ForecastStatus::Critical => {
                prop_assert!(result.days_remaining.unwrap() < 7);
            }
            ForecastStatus::Stable => prop_assert_eq!(result.days_remaining, None),
            ForecastStatus::InsufficientData => prop_assert!(false, "two samples are enough"),
        }
    }
}
