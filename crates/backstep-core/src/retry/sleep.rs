//! Suspension between attempts.

use async_trait::async_trait;
use std::time::Duration;

/// Suspends the calling task for a backoff delay.
///
/// The default implementation is [`TokioSleeper`]. Tests substitute a
/// sleeper that records the requested delays and returns immediately.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
