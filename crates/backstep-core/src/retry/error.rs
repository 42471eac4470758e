//! Terminal failures of a backoff campaign.

use thiserror::Error;

/// Why a call to `perform_backoff` gave up.
///
/// Failures of the wrapped operation are never surfaced one by one; they are
/// retried. Only the campaign's terminal state reaches the caller, together
/// with the most recent operation error when one exists.
///
/// The error type is generic over `E`, the error type of the wrapped
/// operation. It is never inspected.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The retry ceiling was exceeded before the operation succeeded.
    #[error("retries exhausted after {attempts} attempts (max_retries = {max_retries})")]
    Exhausted {
        /// Attempts made since construction or the last reset.
        attempts: u32,
        /// The configured ceiling.
        max_retries: u32,
        /// Error from the last attempt made by this call.
        ///
        /// `None` when the strategy was already exhausted on entry and no
        /// attempt ran; call `reset` to start a fresh campaign.
        last_error: Option<E>,
    },

    /// A wait between attempts was interrupted by a cancellation token.
    #[error("retry cancelled after {attempts} attempts")]
    Cancelled {
        /// Attempts made since construction or the last reset.
        attempts: u32,
        /// Error from the attempt that preceded the interrupted wait.
        last_error: Option<E>,
    },
}

impl<E> RetryError<E> {
    /// Attempts made since construction or the last reset.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Cancelled { attempts, .. } => *attempts,
        }
    }

    /// The most recent operation error, if any attempt ran.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            Self::Exhausted { last_error, .. } | Self::Cancelled { last_error, .. } => {
                last_error.as_ref()
            }
        }
    }

    /// Consume the error and return the most recent operation error.
    pub fn into_last_error(self) -> Option<E> {
        match self {
            Self::Exhausted { last_error, .. } | Self::Cancelled { last_error, .. } => last_error,
        }
    }

    /// `true` if the retry ceiling was reached.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// `true` if a cancellation token stopped the campaign.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
