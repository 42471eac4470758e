//! Sources of randomness for delay jitter.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces the signed offset added to each backoff delay.
///
/// Implementations must sample from the closed range `[-bound, bound]`.
/// Values outside it are clamped by the strategy.
pub trait Jitter: Send {
    /// Sample an offset in nanoseconds from `[-bound, bound]`.
    fn sample(&mut self, bound: u64) -> i64;
}

/// Uniform jitter backed by a [`StdRng`].
///
/// # Examples
///
/// ```
/// use backstep_core::retry::{Jitter, RandomJitter};
///
/// let mut jitter = RandomJitter::seeded(7);
/// let offset = jitter.sample(25);
/// assert!((-25..=25).contains(&offset));
/// ```
#[derive(Debug, Clone)]
pub struct RandomJitter {
    rng: StdRng,
}

impl RandomJitter {
    /// Jitter seeded from the operating system's entropy source.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic jitter, for reproducible tests and simulations.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Jitter for RandomJitter {
    fn sample(&mut self, bound: u64) -> i64 {
        let bound = clamp_bound(bound);
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(-bound..=bound)
    }
}

/// Jitter that always returns zero, making delays deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoJitter;

impl Jitter for NoJitter {
    fn sample(&mut self, _bound: u64) -> i64 {
        0
    }
}

/// Jitter bound for a delay: a quarter of it, rounded down.
pub fn quarter_bound(timeout_nanos: u64) -> u64 {
    timeout_nanos / 4
}

/// Add a jitter offset to a delay, keeping the offset within `bound`.
pub(crate) fn apply(timeout_nanos: u64, offset: i64, bound: u64) -> u64 {
    let bound = clamp_bound(bound);
    let offset = offset.clamp(-bound, bound);
    if offset >= 0 {
        timeout_nanos.saturating_add(offset.unsigned_abs())
    } else {
        timeout_nanos.saturating_sub(offset.unsigned_abs())
    }
}

fn clamp_bound(bound: u64) -> i64 {
    i64::try_from(bound).unwrap_or(i64::MAX)
}
