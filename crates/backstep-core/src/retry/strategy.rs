//! The backoff strategy abstraction.

use super::config::RetryLimit;
use super::error::RetryError;
use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// A stateful retry campaign for an operation producing `T`.
///
/// Implementations track the current attempt number (the *depth*) and the
/// delay to apply before the next retry. Both advance on every failed attempt
/// and survive across calls until [`reset`](Self::reset) is invoked, so a
/// strategy that returned [`RetryError::Exhausted`] keeps refusing until it is
/// reset.
///
/// Methods take `&mut self`: one instance drives one campaign at a time.
/// Callers running concurrent campaigns use one instance per campaign, or
/// share one behind an external `tokio::sync::Mutex`.
///
/// # Examples
///
/// ```rust
/// use backstep_core::retry::{BackoffStrategy, ExponentialBackoff, RetryError};
/// use std::time::Duration;
///
/// async fn fetch<S: BackoffStrategy<u32>>(
///     strategy: &mut S,
/// ) -> Result<u32, RetryError<std::io::Error>> {
///     strategy.perform_backoff(|| async { Ok(7) }).await
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut backoff = ExponentialBackoff::builder()
///     .initial_timeout(Duration::from_millis(10))
///     .max_retries(3)
///     .build();
///
/// assert_eq!(fetch(&mut backoff).await?, 7);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait BackoffStrategy<T: Send>: Send {
    /// Run `operation` until it succeeds or the retry ceiling is exceeded.
    ///
    /// The operation's error is never inspected; every failure is retried.
    /// The state is left as-is on success.
    async fn perform_backoff<F, Fut, E>(&mut self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        E: Send;

    /// Like [`perform_backoff`](Self::perform_backoff), but every wait
    /// between attempts is abandoned as soon as `cancel` fires, returning
    /// [`RetryError::Cancelled`]. A running attempt is never interrupted.
    async fn perform_backoff_with_cancel<F, Fut, E>(
        &mut self,
        operation: F,
        cancel: &CancellationToken,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        E: Send;

    /// Return to attempt 1 with the initial delay. The ceiling is unchanged.
    fn reset(&mut self);

    /// The attempt number the next call will start from (1-based).
    fn depth(&self) -> u32;

    /// The configured retry ceiling.
    fn retry_limit(&self) -> RetryLimit;
}
