use super::{breaker, FakeFetcher};
use opcache_toolkit_circuitbreaker::BreakerConfig;
use opcache_toolkit_commands::WarmupCommand;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn counts_successful_urls() {
    let fetcher = Arc::new(FakeFetcher::new([
        ("https://shop.test/", 200),
        ("https://shop.test/cart", 200),
    ]));
    let command = WarmupCommand::new(Arc::clone(&fetcher), breaker());

    let result = command
        .execute(&["https://shop.test/", "https://shop.test/cart"])
        .await;

    assert!(result.success);
    assert_eq!(result.message, "Warmed up 2 URLs.");
    assert_eq!(result.data, json!({"successCount": 2, "errors": {}}));
}

#[tokio::test]
async fn failures_are_collected_per_url() {
    let fetcher = Arc::new(FakeFetcher::new([
        ("https://shop.test/", 200),
        ("https://shop.test/admin", 503),
    ]));
    let command = WarmupCommand::new(Arc::clone(&fetcher), breaker());

    let result = command
        .execute(&[
            "https://shop.test/",
            "https://shop.test/admin",
            "https://offline.test/",
        ])
        .await;

    assert!(result.success);
    assert_eq!(result.message, "Warmed up 1 URLs.");
    assert_eq!(
        result.data["errors"],
        json!({
            "https://shop.test/admin": "HTTP 503",
            "https://offline.test/": "connection refused",
        })
    );
}

#[tokio::test]
async fn open_circuit_skips_the_remaining_urls() {
    let fetcher = Arc::new(FakeFetcher::new([("https://up.test/", 200)]));
    let config = BreakerConfig::new(2, Duration::from_secs(300)).unwrap();
    let command = WarmupCommand::with_config(Arc::clone(&fetcher), breaker(), config);

    let urls = [
        "https://down.test/1",
        "https://down.test/2",
        "https://up.test/",
        "https://up.test/later",
    ];
    let result = command.execute(&urls).await;

    assert!(result.success);
    assert_eq!(result.data["successCount"], 0);
    let errors = result.data["errors"].as_object().unwrap();
    assert_eq!(errors.len(), 3);
    assert_eq!(errors["https://up.test/"], "circuit breaker for warmup is OPEN");
    assert!(!errors.contains_key("https://up.test/later"));
    assert_eq!(fetcher.requested.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn preset_tolerates_two_failures() {
    let fetcher = Arc::new(FakeFetcher::new([("https://up.test/", 200)]));
    let command = WarmupCommand::new(Arc::clone(&fetcher), breaker());

    let result = command
        .execute(&["https://a.test/", "https://b.test/", "https://up.test/"])
        .await;

    assert_eq!(result.data["successCount"], 1);
}
