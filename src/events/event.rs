//! # Runtime events emitted by the service manager and the resilience primitives.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Service lifecycle**: registration, start, stop and acknowledgment
//! - **Shutdown**: the shutdown request and its final outcome
//! - **Circuit breaker**: state transitions and rejected calls
//! - **Subscriber**: overflow and panics inside subscriber workers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! emitting component's name, reasons and timeouts.
//!
//! ## Ordering guarantees
//! Each event published through a [`Bus`](crate::Bus) receives a sequence
//! number (`seq`) from that bus's own counter, increasing monotonically.
//! Use `seq` to restore publish order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use flowguard::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ServiceStopFailed)
//!     .with_source("ingest")
//!     .with_reason("boom")
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::ServiceStopFailed);
//! assert_eq!(ev.source.as_deref(), Some("ingest"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! assert_eq!(ev.timeout_ms, Some(5_000));
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `source`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    // === Service lifecycle events ===
    /// Service was added to the manager.
    ///
    /// Sets:
    /// - `source`: service name
    ServiceRegistered,

    /// Service task was spawned.
    ///
    /// Sets:
    /// - `source`: service name
    ServiceStarted,

    /// Service refused to start.
    ///
    /// Sets:
    /// - `source`: service name
    /// - `reason`: start error
    ServiceStartFailed,

    /// Manager is waiting for this service to acknowledge stop.
    ///
    /// Sets:
    /// - `source`: service name
    ServiceStopping,

    /// Service task exited and acknowledged stop.
    ///
    /// Sets:
    /// - `source`: service name
    ServiceStopped,

    /// Service task exited with an error or panicked.
    ///
    /// Sets:
    /// - `source`: service name
    /// - `reason`: error message
    ServiceStopFailed,

    /// Service did not acknowledge stop within the configured timeout.
    ///
    /// Sets:
    /// - `source`: service name
    /// - `timeout_ms`: configured stop timeout (ms)
    ServiceStopTimeout,

    // === Shutdown events ===
    /// Shutdown requested (explicit `stop()` or OS signal).
    ShutdownRequested,

    /// Every service got a stop attempt; emitted at the end of `stop()`.
    ShutdownComplete,

    // === Circuit breaker events ===
    /// Breaker tripped to `Open`.
    ///
    /// Sets:
    /// - `source`: breaker name
    /// - `reason`: consecutive failure count
    CircuitOpened,

    /// Breaker let a trial call through (`HalfOpen`).
    ///
    /// Sets:
    /// - `source`: breaker name
    CircuitHalfOpen,

    /// Breaker recovered to `Closed`.
    ///
    /// Sets:
    /// - `source`: breaker name
    CircuitClosed,

    /// Breaker rejected a call without running it.
    ///
    /// Sets:
    /// - `source`: breaker name
    CallRejected,
}

/// Runtime event with optional metadata.
///
/// - `seq`: sequence assigned by the publishing bus (`0` until published)
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Monotonically increasing sequence number, stamped by [`Bus::publish`](crate::Bus::publish).
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the emitting service, breaker or subscriber.
    pub source: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            kind,
            source: None,
            reason: None,
            timeout_ms: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the emitting component's name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}
