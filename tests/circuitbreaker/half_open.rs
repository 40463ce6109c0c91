use super::{deadline_ms, fail, manual_clock, succeed, Unavailable, MINUTE};
use opcache_toolkit_circuitbreaker::{
    BreakerConfig, CircuitBreaker, CircuitState, MemoryKeyValueStore,
};
use tokio::sync::oneshot;

#[tokio::test]
async fn only_one_probe_while_half_open() {
    let (clock, shared) = manual_clock();
    let breaker = CircuitBreaker::builder(MemoryKeyValueStore::new())
        .clock(shared)
        .build();
    let config = BreakerConfig::new(1, MINUTE).unwrap();

    let _ = breaker.execute("db", &config, fail).await;
    clock.advance(MINUTE);

    let (started_tx, started_rx) = oneshot::channel::<()>();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let probe = {
        let breaker = breaker.clone();
        tokio::spawn(async move {
            breaker
                .execute("db", &config, move || async move {
                    let _ = started_tx.send(());
                    let _ = release_rx.await;
                    Err::<(), _>(Unavailable)
                })
                .await
        })
    };
    started_rx.await.unwrap();

    assert_eq!(breaker.snapshot("db").await.state, CircuitState::HalfOpen);
    let err = breaker.execute("db", &config, succeed).await.unwrap_err();
    assert!(err.is_circuit_open());

    release_tx.send(()).unwrap();
    assert!(probe.await.unwrap().unwrap_err().is_operation_failed());

    let state = breaker.snapshot("db").await;
    assert_eq!(state.state, CircuitState::Open);
    let next = state.next_attempt_at.unwrap().timestamp_millis();
    assert_eq!(next, deadline_ms(&clock, MINUTE));
}

#[tokio::test]
async fn stalled_probe_lease_expires() {
    let (clock, shared) = manual_clock();
    let breaker = CircuitBreaker::builder(MemoryKeyValueStore::new())
        .clock(shared)
        .build();
    let config = BreakerConfig::new(3, MINUTE).unwrap();

    for _ in 0..3 {
        let _ = breaker.execute("api", &config, fail).await;
    }
    clock.advance(MINUTE);

    let (started_tx, started_rx) = oneshot::channel::<()>();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let stalled = {
        let breaker = breaker.clone();
        tokio::spawn(async move {
            breaker
                .execute("api", &config, move || async move {
                    let _ = started_tx.send(());
                    let _ = release_rx.await;
                    Err::<(), _>(Unavailable)
                })
                .await
        })
    };
    started_rx.await.unwrap();

    clock.advance(MINUTE);
    breaker.execute("api", &config, succeed).await.unwrap();
    assert_eq!(breaker.snapshot("api").await.state, CircuitState::Closed);

    release_tx.send(()).unwrap();
    let _ = stalled.await.unwrap();

    // The late failure counts against the closed breaker but does not trip it.
    let state = breaker.snapshot("api").await;
    assert_eq!(state.state, CircuitState::Closed);
    assert_eq!(state.failure_count, 1);
}

#[tokio::test]
async fn probe_is_admitted_exactly_at_the_deadline() {
    let (clock, shared) = manual_clock();
    let breaker = CircuitBreaker::builder(MemoryKeyValueStore::new())
        .clock(shared)
        .build();
    let config = BreakerConfig::new(1, MINUTE).unwrap();

    let _ = breaker.execute("edge", &config, fail).await;

    clock.advance(MINUTE - std::time::Duration::from_millis(1));
    assert!(breaker.execute("edge", &config, succeed).await.unwrap_err().is_circuit_open());

    clock.advance(std::time::Duration::from_millis(1));
    breaker.execute("edge", &config, succeed).await.unwrap();
}
