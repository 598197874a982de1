//! Error types used by the flowguard primitives and the service manager.
//!
//! This module defines the error enums shared across the crate:
//!
//! - [`RuntimeError`]: errors raised by the [`ServiceManager`](crate::ServiceManager) itself.
//! - [`ServiceError`]: errors raised by individual services.
//! - [`AcquireError`]: failures waiting on a [`Semaphore`](crate::Semaphore).
//! - [`BreakerError`]: a rejection by a [`CircuitBreaker`](crate::CircuitBreaker)
//!   or the propagated failure of the guarded call.
//! - [`RetryError`]: outcome of [`retry`](crate::retry) when no attempt succeeded.
//!
//! Every type provides `as_label` (stable snake_case string for logs/metrics).

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the service manager.
///
/// These represent failures of the orchestration layer itself rather than
/// of a single service.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `start()` was called on a manager that is already running or stopped.
    #[error("service manager already started")]
    AlreadyStarted,

    /// A service with the same name is already registered.
    #[error("service '{name}' is already registered")]
    Duplicate {
        /// Name of the rejected service.
        name: String,
    },

    /// A service failed to start; previously started services were stopped.
    #[error("service '{name}' failed to start: {source}")]
    StartFailed {
        /// Name of the service that failed.
        name: String,
        /// Underlying service error.
        source: ServiceError,
    },

    /// Some services did not acknowledge stop within the configured timeout.
    #[error("stop timeout {timeout:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured per-service stop timeout.
        timeout: Duration,
        /// Services that did not stop in time, in stop order.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use flowguard::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { timeout: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyStarted => "runtime_already_started",
            RuntimeError::Duplicate { .. } => "runtime_duplicate_service",
            RuntimeError::StartFailed { .. } => "runtime_start_failed",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced by a service.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service task is already running.
    #[error("service '{name}' already started")]
    AlreadyStarted {
        /// Service name.
        name: String,
    },

    /// `stop()` was called before `start()`.
    #[error("service '{name}' was never started")]
    NotStarted {
        /// Service name.
        name: String,
    },

    /// The service task returned an error.
    #[error("service failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The service task panicked.
    #[error("service '{name}' panicked: {reason}")]
    Panicked {
        /// Service name.
        name: String,
        /// Panic payload, when it was a string.
        reason: String,
    },

    /// The service observed cancellation and exited early.
    #[error("context cancelled")]
    Canceled,
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::AlreadyStarted { .. } => "service_already_started",
            ServiceError::NotStarted { .. } => "service_not_started",
            ServiceError::Failed { .. } => "service_failed",
            ServiceError::Panicked { .. } => "service_panicked",
            ServiceError::Canceled => "service_canceled",
        }
    }

    /// Convenience constructor for [`ServiceError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        ServiceError::Failed {
            error: error.into(),
        }
    }
}

/// # Errors produced while waiting for semaphore capacity.
///
/// A failed acquire never changes the semaphore's held weight.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// The caller's cancellation token fired while waiting.
    #[error("acquire cancelled")]
    Cancelled,

    /// Capacity did not become available before the deadline.
    #[error("acquire timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The requested weight can never fit.
    #[error("weight {weight} exceeds capacity {capacity}")]
    WeightExceedsCapacity {
        /// Requested weight.
        weight: u32,
        /// Semaphore capacity.
        capacity: u32,
    },
}

impl AcquireError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            AcquireError::Cancelled => "acquire_cancelled",
            AcquireError::Timeout { .. } => "acquire_timeout",
            AcquireError::WeightExceedsCapacity { .. } => "acquire_weight_exceeds_capacity",
        }
    }
}

/// # Outcome of a call rejected or failed under a circuit breaker.
///
/// Callers can retry `Inner` failures and back off on `Open`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BreakerError<E> {
    /// The circuit is open; the operation was not invoked.
    #[error("circuit open, retry in {remaining:?}")]
    Open {
        /// Time left until the breaker lets a trial call through.
        remaining: Duration,
    },

    /// The operation ran and failed.
    #[error("{0}")]
    Inner(E),
}

impl<E> BreakerError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use flowguard::BreakerError;
    /// use std::time::Duration;
    ///
    /// let err: BreakerError<&str> = BreakerError::Open { remaining: Duration::ZERO };
    /// assert_eq!(err.as_label(), "circuit_open");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BreakerError::Open { .. } => "circuit_open",
            BreakerError::Inner(_) => "underlying_failure",
        }
    }

    /// True if the breaker rejected the call without running it.
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open { .. })
    }

    /// Returns the underlying failure, if the operation ran.
    pub fn into_inner(self) -> Option<E> {
        match self {
            BreakerError::Inner(e) => Some(e),
            BreakerError::Open { .. } => None,
        }
    }
}

/// # Outcome of a retried operation that never succeeded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The token fired before or between attempts.
    #[error("retry cancelled")]
    Cancelled,

    /// All attempts failed; carries the last failure.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error of the final attempt.
        last: E,
    },
}

impl<E> RetryError<E> {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RetryError::Cancelled => "retry_cancelled",
            RetryError::Exhausted { .. } => "retry_exhausted",
        }
    }
}
