//! Typed zero values for failed campaigns.

use crate::retry::RetryError;
use tracing::debug;

/// The canonical empty value of `T`.
///
/// ```
/// use backstep_core::zero::zero;
///
/// assert_eq!(zero::<u32>(), 0);
/// assert_eq!(zero::<String>(), "");
/// assert_eq!(zero::<Option<u8>>(), None);
/// ```
pub fn zero<T: Default>() -> T {
    T::default()
}

/// Collapse a campaign result into a plain value.
///
/// For callers that only need a value and treat every failure alike. The
/// error is dropped, so prefer matching on [`RetryError`] when the cause
/// matters.
pub trait OrZero<T> {
    /// The success value, or [`zero`] if the campaign failed.
    fn or_zero(self) -> T;
}

impl<T: Default, E> OrZero<T> for Result<T, RetryError<E>> {
    fn or_zero(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                debug!(
                    attempts = err.attempts(),
                    cancelled = err.is_cancelled(),
                    "substituting zero value for failed campaign"
                );
                zero()
            }
        }
    }
}
