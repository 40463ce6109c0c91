use super::{breaker, FakeBackend};
use opcache_toolkit_circuitbreaker::{BreakerConfig, CircuitState};
use opcache_toolkit_commands::{PreloadCommand, NOT_ENABLED, PRELOAD_BREAKER};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn compiles_every_target() {
    let backend = Arc::new(FakeBackend::new());
    let command = PreloadCommand::new(Arc::clone(&backend), breaker());

    let result = command
        .execute(&["/srv/app/index.php", "/srv/app/src/Kernel.php"])
        .await;

    assert!(result.success);
    assert_eq!(result.message, "Successfully preloaded 2 files into OPcache.");
    assert_eq!(result.data, json!({"compiledCount": 2, "failedTargets": []}));
}

#[tokio::test]
async fn declined_and_crashed_targets_are_listed() {
    let backend = Arc::new(FakeBackend::new());
    let command = PreloadCommand::new(Arc::clone(&backend), breaker());

    let result = command
        .execute(&["a.php", "missing.php", "crash.php", "b.php"])
        .await;

    assert!(result.success);
    assert_eq!(result.data["compiledCount"], 2);
    assert_eq!(result.data["failedTargets"], json!(["missing.php", "crash.php"]));
    assert_eq!(backend.compiled().len(), 4);
}

#[tokio::test]
async fn declined_scripts_do_not_trip_the_breaker() {
    let backend = Arc::new(FakeBackend::new());
    let breaker = breaker();
    let config = BreakerConfig::new(2, Duration::from_secs(300)).unwrap();
    let command = PreloadCommand::with_config(Arc::clone(&backend), breaker.clone(), config);

    let targets: Vec<String> = (0..5).map(|i| format!("missing-{}.php", i)).collect();
    let result = command.execute(&targets).await;

    assert!(result.success);
    assert_eq!(result.data["failedTargets"].as_array().unwrap().len(), 5);
    assert_eq!(breaker.snapshot(PRELOAD_BREAKER).await.state, CircuitState::Closed);
}

#[tokio::test]
async fn open_circuit_stops_the_batch() {
    let backend = Arc::new(FakeBackend::new());
    let breaker = breaker();
    let config = BreakerConfig::new(2, Duration::from_secs(300)).unwrap();
    let command = PreloadCommand::with_config(Arc::clone(&backend), breaker.clone(), config);

    let result = command
        .execute(&["ok.php", "crash-1.php", "crash-2.php", "never.php"])
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "circuit breaker for preload is OPEN");
    assert_eq!(result.data["compiledCount"], 1);
    assert_eq!(result.data["failedTargets"], json!(["crash-1.php", "crash-2.php"]));
    assert_eq!(backend.compiled(), vec!["ok.php", "crash-1.php", "crash-2.php"]);
}

#[tokio::test]
async fn disabled_cache_is_reported() {
    let backend = Arc::new(FakeBackend::disabled());
    let command = PreloadCommand::new(Arc::clone(&backend), breaker());

    let result = command.execute(&["index.php"]).await;

    assert!(!result.success);
    assert_eq!(result.message, NOT_ENABLED);
    assert_eq!(result.data, json!({}));
    assert!(backend.compiled().is_empty());
}

#[tokio::test]
async fn empty_batch_succeeds() {
    let command = PreloadCommand::new(Arc::new(FakeBackend::new()), breaker());
    let result = command.execute::<&str>(&[]).await;
    assert!(result.success);
    assert_eq!(result.data["compiledCount"], 0);
}
