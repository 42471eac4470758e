//! Retry campaigns with exponential backoff.
//!
//! # Key Types
//!
//! - [`BackoffStrategy`] - Core trait for retry campaigns
//! - [`ExponentialBackoff`] - Depth-anchored exponential backoff with jitter
//! - [`BackoffConfig`] / [`RetryLimit`] - Plain-data configuration
//! - [`Jitter`] / [`Sleeper`] - Injected randomness and suspension
//! - [`RetryError`] - Terminal failures (exhaustion, cancellation)
//!
//! # Examples
//!
//! ```rust
//! use backstep_core::retry::{BackoffConfig, ExponentialBackoff};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BackoffConfig::new(Duration::from_millis(100)).with_max_retries(3);
//! let mut backoff = ExponentialBackoff::new(config);
//!
//! let result = backoff.perform_backoff(|| async {
//!     // Your operation here
//!     Ok::<_, std::io::Error>(42)
//! }).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod exponential;
mod jitter;
mod sleep;
mod strategy;

pub use config::{
    BackoffConfig, ConfigError, DEFAULT_ENV_PREFIX, DEFAULT_INITIAL_TIMEOUT, RetryLimit,
};
pub use error::RetryError;
pub use exponential::{ExponentialBackoff, ExponentialBackoffBuilder};
pub use jitter::{Jitter, NoJitter, RandomJitter, quarter_bound};
pub use sleep::{Sleeper, TokioSleeper};
pub use strategy::BackoffStrategy;
