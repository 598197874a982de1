//! # Retry policy.
//!
//! [`RetryPolicy`] bounds how many times [`retry`](crate::retry) runs an
//! operation and how long it waits between runs.

use crate::policies::backoff::BackoffPolicy;

/// How many attempts to make and how to space them.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Total attempts including the first (`0` is treated as `1`).
    pub max_attempts: u32,
    /// Delay schedule between attempts.
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    /// Three attempts with the default backoff.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl RetryPolicy {
    /// Attempt budget with the `0` sentinel normalized to one attempt.
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}
