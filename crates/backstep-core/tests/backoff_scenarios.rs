//! End-to-end retry campaigns driven through the public API.

use async_trait::async_trait;
use backstep_core::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Records requested delays instead of sleeping.
#[derive(Debug, Clone, Default)]
struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

fn recorded<T>(
    config: BackoffConfig,
) -> (ExponentialBackoff<T, RandomJitter, RecordingSleeper>, RecordingSleeper) {
    let sleeper = RecordingSleeper::default();
    let backoff = ExponentialBackoff::builder()
        .config(config)
        .jitter(RandomJitter::seeded(0x5eed))
        .sleeper(sleeper.clone())
        .build();
    (backoff, sleeper)
}

/// Fails the first `failures` calls, then returns the call number.
struct Flaky {
    calls: AtomicU32,
    failures: u32,
}

impl Flaky {
    fn new(failures: u32) -> Self {
        Self {
            calls: AtomicU32::new(0),
            failures,
        }
    }

    async fn call(&self) -> Result<u32, std::io::Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            Err(std::io::Error::other(format!("transient failure {call}")))
        } else {
            Ok(call)
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_two_failures_then_success_with_ceiling_two() {
    let config = BackoffConfig::new(Duration::from_nanos(1_000)).with_max_retries(2);
    let (mut backoff, sleeper) = recorded::<u32>(config);
    let flaky = Flaky::new(2);

    let value = backoff.perform_backoff(|| flaky.call()).await.unwrap();

    assert_eq!(value, 3);
    assert_eq!(flaky.calls(), 3);
    assert_eq!(backoff.depth(), 3);

    let delays = sleeper.delays();
    assert_eq!(delays.len(), 2);
    // Both waits come from a 1000ns timeout: 1000 << 0 leaves it unchanged.
    for delay in delays {
        assert!((750..=1_250).contains(&delay.as_nanos()));
    }
}

#[tokio::test]
async fn test_always_failing_exhausts_after_three_attempts() {
    let config = BackoffConfig::new(Duration::from_nanos(1_000)).with_max_retries(2);
    let (mut backoff, sleeper) = recorded::<u32>(config);
    let flaky = Flaky::new(u32::MAX);

    let err = backoff.perform_backoff(|| flaky.call()).await.unwrap_err();

    match &err {
        RetryError::Exhausted {
            attempts,
            max_retries,
            last_error,
        } => {
            assert_eq!(*attempts, 3);
            assert_eq!(*max_retries, 2);
            assert_eq!(
                last_error.as_ref().unwrap().to_string(),
                "transient failure 3"
            );
        }
        other => panic!("Expected Exhausted, got {other:?}"),
    }
    assert_eq!(flaky.calls(), 3);
    assert_eq!(backoff.depth(), 4);
    assert_eq!(sleeper.delays().len(), 3);
}

#[tokio::test]
async fn test_wait_sequence_follows_depth_anchored_growth() {
    let config = BackoffConfig::new(Duration::from_nanos(100)).with_max_retries(3);
    let sleeper = RecordingSleeper::default();
    let mut backoff: ExponentialBackoff<(), NoJitter, RecordingSleeper> =
        ExponentialBackoff::with_capabilities(config, NoJitter, sleeper.clone());

    let _ = backoff
        .perform_backoff(|| async { Err::<(), _>("down") })
        .await;

    // Waits use the timeout before growth: 100, 100 (<<0), 200 (<<1), 800 (<<2).
    assert_eq!(
        sleeper.delays(),
        vec![
            Duration::from_nanos(100),
            Duration::from_nanos(100),
            Duration::from_nanos(200),
            Duration::from_nanos(800),
        ]
    );
    assert_eq!(backoff.current_timeout(), Duration::from_nanos(800 << 3));
}

#[tokio::test]
async fn test_unlimited_retries_until_success() {
    let (mut backoff, sleeper) = recorded::<u32>(BackoffConfig::new(Duration::from_nanos(1)));
    let flaky = Flaky::new(25);

    let value = backoff.perform_backoff(|| flaky.call()).await.unwrap();

    assert_eq!(value, 26);
    assert_eq!(sleeper.delays().len(), 25);
    assert_eq!(backoff.retry_limit(), RetryLimit::Unlimited);
}

#[tokio::test]
async fn test_reset_keeps_ceiling_for_next_campaign() {
    let config = BackoffConfig::new(Duration::from_nanos(100)).with_max_retries(1);
    let (mut backoff, _) = recorded::<u32>(config);

    let first = Flaky::new(u32::MAX);
    let err = backoff.perform_backoff(|| first.call()).await.unwrap_err();
    assert!(err.is_exhausted());
    assert_eq!(first.calls(), 2);

    backoff.reset();
    assert_eq!(backoff.depth(), 1);
    assert_eq!(backoff.current_timeout(), Duration::from_nanos(100));

    let second = Flaky::new(u32::MAX);
    let err = backoff.perform_backoff(|| second.call()).await.unwrap_err();
    assert!(err.is_exhausted());
    assert_eq!(second.calls(), 2);
}

#[tokio::test]
async fn test_cancellation_interrupts_long_wait() {
    let mut backoff: ExponentialBackoff<u32> = ExponentialBackoff::builder()
        .initial_timeout(Duration::from_secs(60))
        .build();
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        backoff.perform_backoff_with_cancel(|| async { Err::<u32, _>("refused") }, &token),
    )
    .await
    .expect("cancellation should end the wait");

    let err = result.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.attempts(), 1);
    assert_eq!(err.last_error(), Some(&"refused"));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_uncancelled_token_behaves_like_plain_backoff() {
    let config = BackoffConfig::new(Duration::from_nanos(10)).with_max_retries(4);
    let (mut backoff, sleeper) = recorded::<u32>(config);
    let token = CancellationToken::new();
    let flaky = Flaky::new(3);

    let value = backoff
        .perform_backoff_with_cancel(|| flaky.call(), &token)
        .await
        .unwrap();

    assert_eq!(value, 4);
    assert_eq!(sleeper.delays().len(), 3);
}

#[tokio::test]
async fn test_concurrent_campaigns_use_separate_instances() {
    let mut handles = Vec::new();

    for worker in 0..4u32 {
        handles.push(tokio::spawn(async move {
            let (mut backoff, sleeper) =
                recorded::<u32>(BackoffConfig::new(Duration::from_nanos(5)).with_max_retries(10));
            let flaky = Flaky::new(worker);
            let value = backoff.perform_backoff(|| flaky.call()).await.unwrap();
            (value, sleeper.delays().len())
        }));
    }

    for (worker, handle) in handles.into_iter().enumerate() {
        let (value, waits) = handle.await.unwrap();
        assert_eq!(value, worker as u32 + 1);
        assert_eq!(waits, worker);
    }
}

#[tokio::test]
async fn test_shared_instance_behind_external_mutex() {
    let (backoff, sleeper) = recorded::<u32>(BackoffConfig::new(Duration::from_nanos(5)));
    let shared = Arc::new(tokio::sync::Mutex::new(backoff));

    let mut handles = Vec::new();
    for _ in 0..3 {
        let shared = Arc::clone(&shared);
        handles.push(tokio::spawn(async move {
            let mut backoff = shared.lock().await;
            backoff.reset();
            let flaky = Flaky::new(1);
            backoff.perform_backoff(|| flaky.call()).await.unwrap()
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 2);
    }
    assert_eq!(sleeper.delays().len(), 3);
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Snapshot {
    height: u64,
    peers: Vec<String>,
}

#[tokio::test]
async fn test_result_can_be_encoded_or_zeroed() {
    let (mut backoff, _) = recorded::<Snapshot>(BackoffConfig::new(Duration::from_nanos(1)));
    let calls = AtomicU32::new(0);

    let snapshot = backoff
        .perform_backoff(|| async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("peer unavailable")
            } else {
                Ok(Snapshot {
                    height: 812,
                    peers: vec!["10.0.0.7".to_string()],
                })
            }
        })
        .await
        .or_zero();

    let encoded = snapshot.to_base64_string().unwrap();
    assert_eq!(Snapshot::from_base64_string(&encoded).unwrap(), snapshot);
    assert_eq!(snapshot.height, 812);

    let (mut exhausted, _) =
        recorded::<Snapshot>(BackoffConfig::new(Duration::from_nanos(1)).with_max_retries(0));
    let empty = exhausted
        .perform_backoff(|| async { Err::<Snapshot, _>("peer unavailable") })
        .await
        .or_zero();
    assert_eq!(empty, zero::<Snapshot>());
}
