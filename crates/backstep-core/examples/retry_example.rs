//! Example: retry campaigns with `ExponentialBackoff`
//!
//! This example demonstrates:
//! 1. A flaky operation that succeeds within the retry ceiling
//! 2. Exhaustion, and collapsing the failure to a zero value
//! 3. Cancelling a long wait
//!
//! Run with:
//! ```bash
//! RUST_LOG=backstep_core=debug cargo run -p backstep-core --example retry_example
//! ```

use backstep_core::prelude::*;
use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// A simulated service that fails the first few times
struct UnreliableService {
    attempts: AtomicU32,
    fail_count: u32,
}

impl UnreliableService {
    fn new(fail_count: u32) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            fail_count,
        }
    }

    async fn call(&self) -> Result<String, std::io::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if attempt <= self.fail_count {
            println!("  Attempt {attempt}: FAILED (simulating transient error)");
            Err(std::io::Error::other(format!(
                "Transient error on attempt {attempt}"
            )))
        } else {
            println!("  Attempt {attempt}: SUCCESS");
            Ok("service response".to_string())
        }
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Example 1: two failures, then success
async fn example_simple_retry() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Retry Until Success ===\n");

    let mut backoff = ExponentialBackoff::builder()
        .initial_timeout(Duration::from_millis(100))
        .max_retries(2)
        .jitter(NoJitter)
        .build();

    let service = UnreliableService::new(2);
    let start = Instant::now();

    let result = backoff.perform_backoff(|| service.call()).await?;

    println!("\nResult: {result}");
    println!("Total attempts: {}", service.total_attempts());
    println!("Final depth: {}", backoff.depth());
    println!("Total time: {:?}", start.elapsed());
    println!("Expected waits: 100ms (100 << 0) + 100ms = ~200ms");

    Ok(())
}

/// Example 2: exhaustion
async fn example_exhaustion() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Exhaustion ===\n");

    let mut backoff = ExponentialBackoff::builder()
        .initial_timeout(Duration::from_millis(10))
        .max_retries(2)
        .build();

    let service = UnreliableService::new(u32::MAX);

    match backoff.perform_backoff(|| service.call()).await {
        Ok(value) => println!("Unexpected success: {value}"),
        Err(err) => {
            println!("\nGave up: {err}");
            if let Some(last) = err.last_error() {
                println!("Last error: {last}");
            }
        }
    }

    backoff.reset();
    let fallback = backoff.perform_backoff(|| service.call()).await.or_zero();
    println!("Zero-value fallback: {fallback:?}");

    Ok(())
}

/// Example 3: cancelling a wait
async fn example_cancellation() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: Cancellation ===\n");

    let mut backoff = ExponentialBackoff::builder()
        .initial_timeout(Duration::from_secs(30))
        .build();

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        println!("  Cancelling...");
        trigger.cancel();
    });

    let service = UnreliableService::new(u32::MAX);
    let start = Instant::now();

    let err = backoff
        .perform_backoff_with_cancel(|| service.call(), &token)
        .await
        .expect_err("service never succeeds");

    println!("\nStopped: {err} after {:?}", start.elapsed());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("==============================================");
    println!("   backstep: Retry Strategy Examples");
    println!("==============================================");

    example_simple_retry().await?;
    example_exhaustion().await?;
    example_cancellation().await?;

    println!("\n==============================================");
    println!("   All examples completed successfully!");
    println!("==============================================\n");

    Ok(())
}
