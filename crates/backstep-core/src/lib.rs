#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Exponential backoff for fallible operations.
//!
//! This crate provides:
//!
//! - **A stateful retry campaign** via the `BackoffStrategy` trait
//!   - Depth-anchored exponential growth of the delay
//!   - Quarter-range symmetric jitter
//!   - Optional retry and delay ceilings
//!   - Cancellable waits
//! - **Plain-data configuration** via `BackoffConfig` (serde, environment)
//! - **Encoding helpers** via the `Codec` trait (bytes, base64, JSON)
//! - **Typed zero values** via `zero()` and `OrZero`
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use backstep_core::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut backoff = ExponentialBackoff::builder()
//!     .initial_timeout(Duration::from_millis(100))
//!     .max_retries(3)
//!     .build();
//!
//! let result = backoff.perform_backoff(|| async {
//!     Ok::<_, std::io::Error>(42)
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod retry;
pub mod zero;

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use backstep_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::codec::{Codec, CodecError};
    pub use crate::error_boundary;
    pub use crate::retry::{
        BackoffConfig, BackoffStrategy, ExponentialBackoff, ExponentialBackoffBuilder, Jitter,
        NoJitter, RandomJitter, RetryError, RetryLimit, Sleeper, TokioSleeper,
    };
    pub use crate::zero::{OrZero, zero};
}
