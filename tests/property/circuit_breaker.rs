//! Invariants tested:
//! - The breaker opens exactly when consecutive failures reach the threshold
//! - An open breaker never invokes the operation before its deadline
//! - Any success while closed resets the count

use opcache_toolkit_circuitbreaker::{
    BreakerConfig, CircuitBreaker, CircuitState, MemoryKeyValueStore,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;

#[derive(Debug)]
struct Failed;

impl std::fmt::Display for Failed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed")
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn opens_exactly_at_threshold(threshold in 1u32..=20, failures in 0u32..=40) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let breaker = CircuitBreaker::new(MemoryKeyValueStore::new());
            let config = BreakerConfig::new(threshold, Duration::from_secs(3600)).unwrap();
            let invoked = &AtomicUsize::new(0);

            for _ in 0..failures {
                let _ = breaker
                    .execute("p", &config, move || async move {
                        invoked.fetch_add(1, Ordering::SeqCst);
                        Err::<(), _>(Failed)
                    })
                    .await;
            }

            let state = breaker.snapshot("p").await;
            if failures >= threshold {
                prop_assert_eq!(state.state, CircuitState::Open);
                prop_assert_eq!(invoked.load(Ordering::SeqCst), threshold as usize);
            } else {
                prop_assert_eq!(state.state, CircuitState::Closed);
                prop_assert_eq!(state.failure_count, failures);
            }
            Ok(())
        })?;
    }

    #[test]
    fn success_always_clears_the_count(
        outcomes in prop::collection::vec(any::<bool>(), 1..60),
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let breaker = CircuitBreaker::new(MemoryKeyValueStore::new());
            let config = BreakerConfig::new(u32::MAX, Duration::from_secs(60)).unwrap();

            let mut expected = 0u32;
            for ok in &outcomes {
                let ok = *ok;
                let _ = breaker
                    .execute("p", &config, move || async move {
                        if ok { Ok(()) } else { Err(Failed) }
                    })
                    .await;
                expected = if ok { 0 } else { expected + 1 };
            }

            let state = breaker.snapshot("p").await;
            prop_assert_eq!(state.state, CircuitState::Closed);
            prop_assert_eq!(state.failure_count, expected);
            Ok(())
        })?;
    }
}
