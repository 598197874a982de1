//! # Jitter policy for retry delays.
//!
//! [`JitterPolicy`] randomizes backoff delays so that many callers failing at
//! once do not retry in lockstep.
//!
//! - [`JitterPolicy::None`]: exact delay
//! - [`JitterPolicy::Full`]: uniform in `[0, delay]`
//! - [`JitterPolicy::Equal`]: `delay/2 + uniform[0, delay/2]`
//! - [`JitterPolicy::Decorrelated`]: uniform in `[floor, min(delay * 3, cap)]`

use std::time::Duration;

use rand::Rng;

/// Randomization applied on top of a computed backoff delay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter.
    #[default]
    None,
    /// Random delay in `[0, delay]`.
    Full,
    /// Half the delay plus a random half.
    Equal,
    /// Random delay between the policy floor and three times the delay, capped.
    Decorrelated,
}

impl JitterPolicy {
    /// Applies jitter to `delay`.
    ///
    /// `floor` and `cap` bound the decorrelated variant; the others ignore them
    /// and never exceed `delay`.
    pub fn apply(self, delay: Duration, floor: Duration, cap: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        let mut rng = rand::rng();
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full if ms == 0 => Duration::ZERO,
            JitterPolicy::Full => Duration::from_millis(rng.random_range(0..=ms)),
            JitterPolicy::Equal => {
                let half = ms / 2;
                Duration::from_millis(half + rng.random_range(0..=half))
            }
            JitterPolicy::Decorrelated => {
                let lo = floor.as_millis() as u64;
                let hi = ms.saturating_mul(3).min(cap.as_millis() as u64).max(lo);
                if lo == hi {
                    return Duration::from_millis(lo);
                }
                Duration::from_millis(rng.random_range(lo..=hi))
            }
        }
    }
}
