use super::{repository, sample};
use opcache_toolkit_stats::{ForecastStatus, MemoryStorage, TrendPredictor};

const MIB: u64 = 1_048_576;

#[tokio::test]
async fn empty_history_is_insufficient() {
    let repo = repository(&MemoryStorage::new());
    let forecast = repo.get_memory_prediction(128 * MIB, 64 * MIB).await;
    assert_eq!(forecast.status, ForecastStatus::InsufficientData);
    assert_eq!(forecast.growth_per_sample, None);
}

#[tokio::test]
async fn steady_growth_near_capacity_is_critical() {
    let storage = MemoryStorage::new();
    let repo = repository(&storage);
    for n in 0..10 {
        assert!(repo.insert(&sample(n, n as u64 * MIB)).await);
    }

    // growth = 9 MiB / 10 samples, 4 MiB left => 4 days
    let forecast = repo.get_memory_prediction(128 * MIB, 124 * MIB).await;
    assert_eq!(forecast.status, ForecastStatus::Critical);
    assert_eq!(forecast.days_remaining, Some(4));
}

#[tokio::test]
async fn prediction_uses_only_the_recent_window() {
    let storage = MemoryStorage::new();
    let repo = repository(&storage);
    // Old spike, then 30 flat samples.
    assert!(repo.insert(&sample(0, 0)).await);
    for n in 1..=30 {
        assert!(repo.insert(&sample(n, 50 * MIB)).await);
    }

    let forecast = repo.get_memory_prediction(128 * MIB, 127 * MIB).await;
    assert_eq!(forecast.status, ForecastStatus::Stable);
    assert_eq!(forecast.growth_per_sample, Some(0.0));
}

#[test]
fn forecast_serializes_without_absent_fields() {
    let stable = TrendPredictor::new().predict(&[5, 5], 100, 10);
    assert_eq!(
        serde_json::to_value(stable).unwrap(),
        serde_json::json!({"status": "stable", "growthPerSample": 0.0})
    );

    let warning = TrendPredictor::new().predict(&[0, 10], 1_000, 900);
    assert_eq!(
        serde_json::to_value(warning).unwrap(),
        serde_json::json!({"status": "warning", "daysRemaining": 20, "growthPerSample": 5.0})
    );
}
