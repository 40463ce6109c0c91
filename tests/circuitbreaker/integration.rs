use super::{fail, manual_clock, succeed, Unavailable, MINUTE};
use opcache_toolkit_circuitbreaker::{
    BreakerConfig, CircuitBreaker, CircuitState, MemoryKeyValueStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[tokio::test]
async fn full_lifecycle_closed_open_half_open_closed() {
    let (clock, shared) = manual_clock();
    let breaker = CircuitBreaker::builder(MemoryKeyValueStore::new())
        .clock(shared)
        .build();
    let config = BreakerConfig::new(3, MINUTE).unwrap();

    for _ in 0..3 {
        let err = breaker.execute("db", &config, fail).await.unwrap_err();
        assert!(err.is_operation_failed());
    }
    assert_eq!(breaker.snapshot("db").await.state, CircuitState::Open);

    let err = breaker.execute("db", &config, succeed).await.unwrap_err();
    assert!(err.is_circuit_open());
    assert_eq!(err.to_string(), "circuit breaker for db is OPEN");

    clock.advance(MINUTE);
    breaker.execute("db", &config, succeed).await.unwrap();

    let state = breaker.snapshot("db").await;
    assert_eq!(state.state, CircuitState::Closed);
    assert_eq!(state.failure_count, 0);
    assert_eq!(state.next_attempt_at, None);
}

#[tokio::test]
async fn success_resets_the_consecutive_count() {
    let breaker = CircuitBreaker::new(MemoryKeyValueStore::new());
    let config = BreakerConfig::new(3, MINUTE).unwrap();

    for _ in 0..5 {
        let _ = breaker.execute("api", &config, fail).await;
        let _ = breaker.execute("api", &config, fail).await;
        breaker.execute("api", &config, succeed).await.unwrap();
    }

    let state = breaker.snapshot("api").await;
    assert_eq!(state.state, CircuitState::Closed);
    assert_eq!(state.failure_count, 0);
}

#[tokio::test]
async fn rejected_calls_never_reach_the_operation() {
    let breaker = CircuitBreaker::new(MemoryKeyValueStore::new());
    let config = BreakerConfig::new(1, MINUTE).unwrap();
    let calls = &AtomicUsize::new(0);

    let _ = breaker.execute("cdn", &config, fail).await;
    for _ in 0..10 {
        let result = breaker
            .execute("cdn", &config, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Unavailable>(())
            })
            .await;
        assert!(result.unwrap_err().is_circuit_open());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn operation_errors_pass_through_unchanged() {
    let breaker = CircuitBreaker::new(MemoryKeyValueStore::new());
    let err = breaker
        .execute("io", &BreakerConfig::default(), || async {
            Err::<(), _>(std::io::Error::new(std::io::ErrorKind::NotFound, "missing.php"))
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), "operation_failed");
    let inner = err.into_operation_error().unwrap();
    assert_eq!(inner.kind(), std::io::ErrorKind::NotFound);
}

#[tokio::test]
async fn reset_closes_an_open_breaker() {
    let transitions = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&transitions);
    let breaker = CircuitBreaker::builder(MemoryKeyValueStore::new())
        .on_state_transition(move |_, to| {
            if to == CircuitState::Closed {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build();
    let config = BreakerConfig::new(1, MINUTE).unwrap();

    let _ = breaker.execute("preload", &config, fail).await;
    breaker.reset("preload").await;

    assert_eq!(breaker.snapshot("preload").await.state, CircuitState::Closed);
    assert_eq!(transitions.load(Ordering::SeqCst), 1);
    breaker.execute("preload", &config, succeed).await.unwrap();
}

#[tokio::test]
async fn presets_differ_in_threshold() {
    let breaker = CircuitBreaker::new(MemoryKeyValueStore::new());

    for _ in 0..3 {
        let _ = breaker.execute("warmup", &BreakerConfig::warmup(), fail).await;
        let _ = breaker.execute("preload", &BreakerConfig::preload(), fail).await;
    }

    assert_eq!(breaker.snapshot("warmup").await.state, CircuitState::Open);
    let preload = breaker.snapshot("preload").await;
    assert_eq!(preload.state, CircuitState::Closed);
    assert_eq!(preload.failure_count, 3);
}
