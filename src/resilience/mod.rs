//! Primitives that protect callers and dependencies from overload and failure.
//!
//! - [`Semaphore`]: weighted, cancellable concurrency limit;
//! - [`Group`]: one in-flight execution per key;
//! - [`RateLimiter`]: tick-paced request processing;
//! - [`CircuitBreaker`]: stop calling a dependency that keeps failing;
//! - [`retry`] / [`retry_if`]: repeat an operation under a [`RetryPolicy`](crate::RetryPolicy).

mod circuit_breaker;
mod rate_limiter;
mod retry;
mod semaphore;
mod single_flight;

pub use circuit_breaker::{BreakerState, CircuitBreaker, CircuitBreakerConfig};
pub use rate_limiter::RateLimiter;
pub use retry::{retry, retry_if};
pub use semaphore::{OwnedPermit, Permit, Semaphore};
pub use single_flight::Group;
