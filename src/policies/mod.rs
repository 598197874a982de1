//! Retry policies.
//!
//! ## Contents
//! - [`RetryPolicy`] how many attempts and which backoff
//! - [`BackoffPolicy`] how delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`] randomization strategy to avoid thundering herd
//!
//! ## Defaults
//! - `RetryPolicy::default()` → 3 attempts.
//! - `BackoffPolicy::default()` → first=100ms, factor=2.0, max=10s, jitter=None.

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
