use super::{fail, succeed, Unavailable, MINUTE};
use opcache_toolkit_circuitbreaker::{
    BreakerConfig, CircuitBreaker, CircuitState, MemoryKeyValueStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// 50 concurrent failing calls: every recorded failure is counted once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_failures_are_all_counted() {
    let breaker = CircuitBreaker::new(MemoryKeyValueStore::new());
    let config = BreakerConfig::new(5, MINUTE).unwrap();
    let invoked = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..50 {
        let breaker = breaker.clone();
        let invoked = Arc::clone(&invoked);
        handles.push(tokio::spawn(async move {
            breaker
                .execute("db", &config, move || async move {
                    invoked.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    Err::<(), _>(Unavailable)
                })
                .await
        }));
    }

    let mut failed = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Err(e) if e.is_operation_failed() => failed += 1,
            Err(e) if e.is_circuit_open() => rejected += 1,
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    assert_eq!(failed + rejected, 50);
    assert!(failed >= 5);
    assert_eq!(invoked.load(Ordering::SeqCst), failed);

    let state = breaker.snapshot("db").await;
    assert_eq!(state.state, CircuitState::Open);
    assert_eq!(state.failure_count as usize, failed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn names_do_not_interfere() {
    let breaker = CircuitBreaker::new(MemoryKeyValueStore::new());
    let config = BreakerConfig::new(1, MINUTE).unwrap();

    let failing = {
        let breaker = breaker.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                let _ = breaker
                    .execute("broken", &config, || async { Err::<(), _>(Unavailable) })
                    .await;
            }
        })
    };
    let healthy = {
        let breaker = breaker.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                breaker.execute("healthy", &config, succeed).await.unwrap();
            }
        })
    };

    failing.await.unwrap();
    healthy.await.unwrap();

    assert_eq!(breaker.snapshot("broken").await.state, CircuitState::Open);
    assert_eq!(breaker.snapshot("healthy").await.state, CircuitState::Closed);
}

/// The state lock is not held while the operation runs.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn slow_operations_run_in_parallel() {
    let breaker = CircuitBreaker::new(MemoryKeyValueStore::new());
    let config = BreakerConfig::default();
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let breaker = breaker.clone();
        let running = Arc::clone(&running);
        let peak = Arc::clone(&peak);
        handles.push(tokio::spawn(async move {
            breaker
                .execute("slow", &config, move || async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, Unavailable>(())
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert!(peak.load(Ordering::SeqCst) > 1);
}

/// A call admitted while closed that succeeds after the breaker tripped
/// leaves it open.
#[tokio::test]
async fn late_success_does_not_close_tripped_breaker() {
    let breaker = CircuitBreaker::new(MemoryKeyValueStore::new());
    let config = BreakerConfig::new(1, MINUTE).unwrap();

    let (started_tx, started_rx) = oneshot::channel::<()>();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let slow = {
        let breaker = breaker.clone();
        tokio::spawn(async move {
            breaker
                .execute("db", &config, move || async move {
                    let _ = started_tx.send(());
                    let _ = release_rx.await;
                    Ok::<_, Unavailable>(())
                })
                .await
        })
    };
    started_rx.await.unwrap();

    let err = breaker.execute("db", &config, fail).await.unwrap_err();
    assert!(err.is_operation_failed());
    assert_eq!(breaker.snapshot("db").await.state, CircuitState::Open);

    release_tx.send(()).unwrap();
    slow.await.unwrap().unwrap();

    let state = breaker.snapshot("db").await;
    assert_eq!(state.state, CircuitState::Open);
    assert_eq!(state.failure_count, 1);
    assert!(state.next_attempt_at.is_some());
}
