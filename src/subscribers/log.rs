//! # LogWriter: event printer backed by `tracing`
//!
//! A minimal subscriber that renders incoming [`Event`]s as `tracing` records.
//! Install any `tracing` subscriber in the application to see them.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO flowguard: [registered] service="ingest"
//! INFO flowguard: [started] service="ingest"
//! INFO flowguard: [shutdown-requested]
//! INFO flowguard: [stopping] service="ingest"
//! WARN flowguard: [stop-failed] service="ingest" err="disk full"
//! WARN flowguard: [circuit-open] breaker="db" err="3 consecutive failures"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let src = e.source.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::ServiceRegistered => {
                tracing::info!(target: "flowguard", "[registered] service={src:?}");
            }
            EventKind::ServiceStarted => {
                tracing::info!(target: "flowguard", "[started] service={src:?}");
            }
            EventKind::ServiceStartFailed => {
                tracing::warn!(
                    target: "flowguard",
                    "[start-failed] service={src:?} err={reason:?}"
                );
            }
            EventKind::ServiceStopping => {
                tracing::info!(target: "flowguard", "[stopping] service={src:?}");
            }
            EventKind::ServiceStopped => {
                tracing::info!(target: "flowguard", "[stopped] service={src:?}");
            }
            EventKind::ServiceStopFailed => {
                tracing::warn!(target: "flowguard", "[stop-failed] service={src:?} err={reason:?}");
            }
            EventKind::ServiceStopTimeout => {
                tracing::warn!(
                    target: "flowguard",
                    "[stop-timeout] service={src:?} timeout_ms={:?}",
                    e.timeout_ms
                );
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "flowguard", "[shutdown-requested]");
            }
            EventKind::ShutdownComplete => {
                tracing::info!(target: "flowguard", "[shutdown-complete]");
            }
            EventKind::CircuitOpened => {
                tracing::warn!(
                    target: "flowguard",
                    "[circuit-open] breaker={src:?} err={reason:?}"
                );
            }
            EventKind::CircuitHalfOpen => {
                tracing::info!(target: "flowguard", "[circuit-half-open] breaker={src:?}");
            }
            EventKind::CircuitClosed => {
                tracing::info!(target: "flowguard", "[circuit-closed] breaker={src:?}");
            }
            EventKind::CallRejected => {
                tracing::debug!(target: "flowguard", "[call-rejected] breaker={src:?}");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(
                    target: "flowguard",
                    "[subscriber-overflow] subscriber={src:?} reason={reason:?}"
                );
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(
                    target: "flowguard",
                    "[subscriber-panicked] subscriber={src} info={reason}"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
