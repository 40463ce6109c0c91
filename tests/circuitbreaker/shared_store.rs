use super::{deadline_ms, fail, manual_clock, succeed, MINUTE};
use opcache_toolkit_circuitbreaker::{
    BreakerConfig, BreakerKeys, CircuitBreaker, CircuitState, MemoryKeyValueStore,
};

/// Two breakers over clones of one store behave like two processes.
#[tokio::test]
async fn state_opened_by_one_instance_is_seen_by_another() {
    let store = MemoryKeyValueStore::new();
    let worker_a = CircuitBreaker::new(store.clone());
    let worker_b = CircuitBreaker::new(store.clone());
    let config = BreakerConfig::new(2, MINUTE).unwrap();

    let _ = worker_a.execute("compile", &config, fail).await;
    let _ = worker_b.execute("compile", &config, fail).await;

    let err = worker_a.execute("compile", &config, succeed).await.unwrap_err();
    assert!(err.is_circuit_open());
    let err = worker_b.execute("compile", &config, succeed).await.unwrap_err();
    assert!(err.is_circuit_open());
}

#[tokio::test]
async fn persisted_values_are_plain_strings() {
    let store = MemoryKeyValueStore::new();
    let (clock, shared) = manual_clock();
    let breaker = CircuitBreaker::builder(store.clone()).clock(shared).build();
    let config = BreakerConfig::new(1, MINUTE).unwrap();

    let _ = breaker.execute("reset", &config, fail).await;

    let keys = BreakerKeys::for_name("reset");
    assert_eq!(keys.state, "opcache_toolkit_cb_reset_state");
    assert_eq!(store.value(&keys.state).as_deref(), Some("OPEN"));
    assert_eq!(store.value(&keys.failures).as_deref(), Some("1"));

    let expected = deadline_ms(&clock, MINUTE);
    assert_eq!(keys.next_attempt, "opcache_toolkit_cb_reset_next_attempt_ms");
    assert_eq!(store.value(&keys.next_attempt), Some(expected.to_string()));
    // The seconds-based key is left for other writers.
    assert_eq!(store.value("opcache_toolkit_cb_reset_next_attempt"), None);
}

#[tokio::test]
async fn externally_written_state_is_honored() {
    let store = MemoryKeyValueStore::new();
    let (clock, shared) = manual_clock();
    let keys = BreakerKeys::for_name("warmup");
    store.insert(keys.state.clone(), "OPEN");
    store.insert(keys.failures.clone(), "3");
    store.insert(keys.next_attempt.clone(), deadline_ms(&clock, MINUTE).to_string());

    let breaker = CircuitBreaker::builder(store.clone()).clock(shared).build();
    let config = BreakerConfig::warmup();

    let err = breaker.execute("warmup", &config, succeed).await.unwrap_err();
    assert!(err.is_circuit_open());

    clock.advance(MINUTE);
    breaker.execute("warmup", &config, succeed).await.unwrap();
    assert_eq!(store.value(&keys.state).as_deref(), Some("CLOSED"));
    assert_eq!(store.value(&keys.failures).as_deref(), Some("0"));
}

#[tokio::test]
async fn garbage_in_the_store_reads_as_closed() {
    let store = MemoryKeyValueStore::new();
    let keys = BreakerKeys::for_name("preload");
    store.insert(keys.state.clone(), "SIDEWAYS");
    store.insert(keys.failures.clone(), "many");
    store.insert(keys.next_attempt.clone(), "soon");

    let breaker = CircuitBreaker::new(store);
    let state = breaker.snapshot("preload").await;
    assert_eq!(state.state, CircuitState::Closed);
    assert_eq!(state.failure_count, 0);
    assert_eq!(state.next_attempt_at, None);

    breaker
        .execute("preload", &BreakerConfig::preload(), succeed)
        .await
        .unwrap();
}
