//! Exponential backoff with quarter-range jitter.

use super::config::{BackoffConfig, DEFAULT_INITIAL_TIMEOUT, RetryLimit, duration_to_nanos};
use super::error::RetryError;
use super::jitter::{self, Jitter, RandomJitter};
use super::sleep::{Sleeper, TokioSleeper};
use super::strategy::BackoffStrategy;
use async_trait::async_trait;
use std::future::Future;
use std::marker::PhantomData;
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Exponential backoff strategy with jitter and an optional retry ceiling.
///
/// One instance is one retry campaign. After a failure at depth `d` the
/// strategy:
///
/// 1. waits `current_timeout + jitter`, where jitter is drawn uniformly from
///    `[-current_timeout/4, +current_timeout/4]`;
/// 2. shifts `current_timeout` left by `d - 1` bits;
/// 3. moves to depth `d + 1`.
///
/// Growth is anchored to the depth of the failure, so the delay sequence
/// accelerates faster than plain doubling:
///
/// ```text
/// initial = 100ns
/// failure at depth 1: wait ~100, timeout 100 << 0 = 100
/// failure at depth 2: wait ~100, timeout 100 << 1 = 200
/// failure at depth 3: wait ~200, timeout 200 << 2 = 800
/// ```
///
/// The timeout saturates at `u64::MAX` nanoseconds, or at the configured
/// `max_timeout`, instead of overflowing.
///
/// Before each attempt the ceiling is checked: with `max_retries = k` the
/// operation runs at most `k + 1` times (see [`RetryLimit`]).
///
/// # Examples
///
/// ```rust
/// use backstep_core::retry::ExponentialBackoff;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut backoff = ExponentialBackoff::builder()
///     .initial_timeout(Duration::from_millis(100))
///     .max_retries(5)
///     .build();
///
/// let result = backoff.perform_backoff(|| async {
///     // Your operation here
///     Ok::<_, std::io::Error>(42)
/// }).await?;
/// assert_eq!(result, 42);
/// # Ok(())
/// # }
/// ```
///
/// # Type Parameters
///
/// - `T`: the operation's success type; no bounds beyond `Send` for async use
/// - `J`: the [`Jitter`] source, [`RandomJitter`] by default
/// - `S`: the [`Sleeper`], [`TokioSleeper`] by default
pub struct ExponentialBackoff<T, J = RandomJitter, S = TokioSleeper> {
    depth: u32,
    initial_timeout: u64,
    current_timeout: u64,
    max_timeout: Option<u64>,
    limit: RetryLimit,
    jitter: J,
    sleeper: S,
    _result: PhantomData<fn() -> T>,
}

impl<T> ExponentialBackoff<T, RandomJitter, TokioSleeper> {
    /// Create a strategy from a configuration, with random jitter and the
    /// tokio timer.
    pub fn new(config: BackoffConfig) -> Self {
        Self::with_capabilities(config, RandomJitter::new(), TokioSleeper)
    }

    /// Create a new builder for configuring exponential backoff.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use backstep_core::retry::{ExponentialBackoff, NoJitter};
    /// use std::time::Duration;
    ///
    /// let backoff: ExponentialBackoff<String, NoJitter> = ExponentialBackoff::builder()
    ///     .initial_timeout(Duration::from_millis(50))
    ///     .max_retries(4)
    ///     .jitter(NoJitter)
    ///     .build();
    ///
    /// assert_eq!(backoff.current_timeout(), Duration::from_millis(50));
    /// ```
    pub fn builder() -> ExponentialBackoffBuilder<T, RandomJitter, TokioSleeper> {
        ExponentialBackoffBuilder::default()
    }
}

impl<T> Default for ExponentialBackoff<T, RandomJitter, TokioSleeper> {
    /// 100ms initial delay, unlimited retries.
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

impl<T> From<BackoffConfig> for ExponentialBackoff<T, RandomJitter, TokioSleeper> {
    fn from(config: BackoffConfig) -> Self {
        Self::new(config)
    }
}

impl<T, J, S> ExponentialBackoff<T, J, S>
where
    J: Jitter,
    S: Sleeper,
{
    /// Create a strategy with explicit jitter and sleep capabilities.
    pub fn with_capabilities(config: BackoffConfig, jitter: J, sleeper: S) -> Self {
        Self {
            depth: 1,
            initial_timeout: config.initial_timeout_nanos,
            current_timeout: config.initial_timeout_nanos,
            max_timeout: config.max_timeout_nanos,
            limit: config.retry_limit(),
            jitter,
            sleeper,
            _result: PhantomData,
        }
    }

    /// Run `operation` until it succeeds or the retry ceiling is exceeded.
    ///
    /// # Returns
    /// - `Ok(T)`: the first successful result, passed through unchanged
    /// - `Err(RetryError::Exhausted)`: the ceiling was exceeded
    ///
    /// The strategy is not reset on success; call [`reset`](Self::reset)
    /// before reusing it for an unrelated campaign.
    pub async fn perform_backoff<F, Fut, E>(&mut self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(operation, None).await
    }

    /// Run `operation` with backoff, abandoning any wait once `cancel` fires.
    ///
    /// Cancellation is only observed while waiting between attempts. A token
    /// cancelled before the call still lets the current attempt run; if that
    /// attempt fails, [`RetryError::Cancelled`] is returned without waiting.
    pub async fn perform_backoff_with_cancel<F, Fut, E>(
        &mut self,
        operation: F,
        cancel: &CancellationToken,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(operation, Some(cancel)).await
    }

    /// Return to depth 1 and the initial delay. The ceiling is unchanged.
    pub fn reset(&mut self) {
        debug!(
            depth = self.depth,
            initial_timeout_ns = self.initial_timeout,
            "resetting backoff"
        );
        self.depth = 1;
        self.current_timeout = self.initial_timeout;
    }

    /// The attempt number the next call will start from (1-based).
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Delay applied before the next retry, before jitter.
    pub fn current_timeout(&self) -> Duration {
        Duration::from_nanos(self.current_timeout)
    }

    /// Delay configured at construction.
    pub fn initial_timeout(&self) -> Duration {
        Duration::from_nanos(self.initial_timeout)
    }

    /// The configured retry ceiling.
    pub fn retry_limit(&self) -> RetryLimit {
        self.limit
    }

    /// The inclusive range the next wait will be drawn from.
    pub fn next_delay_range(&self) -> RangeInclusive<Duration> {
        let bound = jitter::quarter_bound(self.current_timeout);
        let low = self.current_timeout - bound;
        let high = self.current_timeout.saturating_add(bound);
        Duration::from_nanos(low)..=Duration::from_nanos(high)
    }

    async fn run<F, Fut, E>(
        &mut self,
        mut operation: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut last_error = None;

        loop {
            if !self.limit.permits(self.depth) {
                let attempts = self.depth - 1;
                let max_retries = self.limit.as_option().unwrap_or(u32::MAX);
                warn!(attempts, max_retries, "backoff retries exhausted");
                return Err(RetryError::Exhausted {
                    attempts,
                    max_retries,
                    last_error,
                });
            }

            let error = match operation().await {
                Ok(value) => {
                    trace!(depth = self.depth, "operation succeeded");
                    return Ok(value);
                }
                Err(error) => error,
            };

            let delay = self.record_failure();
            let attempts = self.depth - 1;

            match cancel {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            info!(attempts, "backoff cancelled while waiting");
                            return Err(RetryError::Cancelled {
                                attempts,
                                last_error: Some(error),
                            });
                        }
                        _ = self.sleeper.sleep(delay) => {}
                    }
                }
                None => self.sleeper.sleep(delay).await,
            }

            last_error = Some(error);
        }
    }

    /// Advance the state after a failed attempt and return the wait.
    fn record_failure(&mut self) -> Duration {
        let bound = jitter::quarter_bound(self.current_timeout);
        let offset = self.jitter.sample(bound);
        let delay = jitter::apply(self.current_timeout, offset, bound);

        let mut next = grow(self.current_timeout, self.depth - 1);
        if let Some(ceiling) = self.max_timeout {
            next = next.min(ceiling.max(self.initial_timeout));
        }

        debug!(
            depth = self.depth,
            delay_ns = delay,
            jitter_ns = offset,
            next_timeout_ns = next,
            "operation failed, backing off"
        );

        self.current_timeout = next;
        self.depth = self.depth.saturating_add(1);
        Duration::from_nanos(delay)
    }
}

#[async_trait]
impl<T, J, S> BackoffStrategy<T> for ExponentialBackoff<T, J, S>
where
    T: Send,
    J: Jitter,
    S: Sleeper,
{
    async fn perform_backoff<F, Fut, E>(&mut self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        E: Send,
    {
        self.run(operation, None).await
    }

    async fn perform_backoff_with_cancel<F, Fut, E>(
        &mut self,
        operation: F,
        cancel: &CancellationToken,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
        E: Send,
    {
        self.run(operation, Some(cancel)).await
    }

    fn reset(&mut self) {
        ExponentialBackoff::reset(self);
    }

    fn depth(&self) -> u32 {
        self.depth
    }

    fn retry_limit(&self) -> RetryLimit {
        self.limit
    }
}

impl<T, J: std::fmt::Debug, S: std::fmt::Debug> std::fmt::Debug for ExponentialBackoff<T, J, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExponentialBackoff")
            .field("depth", &self.depth)
            .field("initial_timeout", &self.initial_timeout)
            .field("current_timeout", &self.current_timeout)
            .field("max_timeout", &self.max_timeout)
            .field("limit", &self.limit)
            .field("jitter", &self.jitter)
            .field("sleeper", &self.sleeper)
            .finish()
    }
}

/// `timeout << shift`, saturating at `u64::MAX` when bits would be lost.
pub(crate) fn grow(timeout: u64, shift: u32) -> u64 {
    if timeout == 0 {
        0
    } else if shift >= 64 || timeout.leading_zeros() < shift {
        u64::MAX
    } else {
        timeout << shift
    }
}

/// Builder for configuring [`ExponentialBackoff`].
///
/// Unset values fall back to [`BackoffConfig::default`]: 100ms initial
/// delay, unlimited retries, no delay ceiling.
///
/// # Examples
///
/// ```rust
/// use backstep_core::retry::{ExponentialBackoff, RetryLimit};
/// use std::time::Duration;
///
/// let backoff: ExponentialBackoff<()> = ExponentialBackoff::builder()
///     .initial_timeout(Duration::from_millis(100))
///     .max_retries(5)
///     .max_timeout(Duration::from_secs(30))
///     .build();
///
/// assert_eq!(backoff.retry_limit(), RetryLimit::Bounded(5));
/// ```
pub struct ExponentialBackoffBuilder<T, J, S> {
    config: BackoffConfig,
    jitter: J,
    sleeper: S,
    _result: PhantomData<fn() -> T>,
}

impl<T> Default for ExponentialBackoffBuilder<T, RandomJitter, TokioSleeper> {
    fn default() -> Self {
        Self {
            config: BackoffConfig::new(DEFAULT_INITIAL_TIMEOUT),
            jitter: RandomJitter::new(),
            sleeper: TokioSleeper,
            _result: PhantomData,
        }
    }
}

impl<T, J, S> ExponentialBackoffBuilder<T, J, S>
where
    J: Jitter,
    S: Sleeper,
{
    /// Start from an existing configuration.
    pub fn config(mut self, config: BackoffConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the delay before the first retry.
    ///
    /// Default: 100ms
    pub fn initial_timeout(mut self, timeout: Duration) -> Self {
        self.config.initial_timeout_nanos = duration_to_nanos(timeout);
        self
    }

    /// Set the retry ceiling. The operation runs at most `max_retries + 1`
    /// times.
    ///
    /// Default: unlimited
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = Some(max_retries);
        self
    }

    /// Retry until success.
    pub fn unlimited(mut self) -> Self {
        self.config.max_retries = None;
        self
    }

    /// Cap the grown delay. Values below the initial delay are raised to it.
    ///
    /// Default: no cap
    pub fn max_timeout(mut self, timeout: Duration) -> Self {
        self.config.max_timeout_nanos = Some(duration_to_nanos(timeout));
        self
    }

    /// Replace the jitter source.
    pub fn jitter<J2: Jitter>(self, jitter: J2) -> ExponentialBackoffBuilder<T, J2, S> {
        ExponentialBackoffBuilder {
            config: self.config,
            jitter,
            sleeper: self.sleeper,
            _result: PhantomData,
        }
    }

    /// Replace the sleeper.
    pub fn sleeper<S2: Sleeper>(self, sleeper: S2) -> ExponentialBackoffBuilder<T, J, S2> {
        ExponentialBackoffBuilder {
            config: self.config,
            jitter: self.jitter,
            sleeper,
            _result: PhantomData,
        }
    }

    /// Build the [`ExponentialBackoff`] instance.
    pub fn build(self) -> ExponentialBackoff<T, J, S> {
        ExponentialBackoff::with_capabilities(self.config, self.jitter, self.sleeper)
    }
}
