//! # Backoff policy for retried calls.
//!
//! The delay before retry `n` (0-indexed) is `first × factor^n`, clamped to
//! `max`, then jittered. The base is derived from the attempt number alone, so
//! jitter never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use flowguard::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.delay(0), Duration::from_millis(100));
//! assert_eq!(backoff.delay(1), Duration::from_millis(200));
//! assert_eq!(backoff.delay(10), Duration::from_secs(10));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Exponential backoff with a cap and optional jitter.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied to each delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 100ms`, `factor = 2.0`, `max = 10s`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(10),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// A constant delay between retries.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Computes the delay before retry number `attempt` (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);
        let base = if secs.is_finite() && secs >= 0.0 && secs <= self.max.as_secs_f64() {
            Duration::from_secs_f64(secs)
        } else {
            self.max
        };
        self.jitter.apply(base, self.first.min(self.max), self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(first_ms: u64, max_ms: u64) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_millis(max_ms),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn grows_exponentially_until_cap() {
        let p = exp(100, 1_000);
        let got: Vec<u64> = (0..6).map(|n| p.delay(n).as_millis() as u64).collect();
        assert_eq!(got, vec![100, 200, 400, 800, 1_000, 1_000]);
    }

    #[test]
    fn first_above_max_is_clamped() {
        assert_eq!(exp(5_000, 1_000).delay(0), Duration::from_millis(1_000));
    }

    #[test]
    fn overflow_clamps_to_max() {
        assert_eq!(exp(100, 1_000).delay(u32::MAX), Duration::from_millis(1_000));
    }

    #[test]
    fn constant_never_changes() {
        let p = BackoffPolicy::constant(Duration::from_millis(250));
        for n in 0..20 {
            assert_eq!(p.delay(n), Duration::from_millis(250));
        }
    }

    #[test]
    fn equal_jitter_keeps_at_least_half() {
        let p = BackoffPolicy {
            jitter: JitterPolicy::Equal,
            ..exp(100, 30_000)
        };
        for n in 0..12 {
            let base = (100u64 << n).min(30_000);
            let d = p.delay(n).as_millis() as u64;
            assert!(d >= base / 2 && d <= base, "attempt {n}: {d}ms vs base {base}ms");
        }
    }
}
