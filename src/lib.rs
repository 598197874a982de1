//! # flowguard
//!
//! **flowguard** is a toolkit of concurrency and resilience primitives for
//! async Rust services.
//!
//! It provides stream combinators (pipelines, fan-out/fan-in, first-of),
//! admission control (semaphore, rate limiter, single-flight), failure
//! containment (circuit breaker, retry) and a graceful-shutdown
//! [`ServiceManager`] that starts services in order and stops them in reverse.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Service    │   │   Service    │   │   Service    │
//!     │ (user svc 1) │   │ (user svc 2) │   │ (user svc 3) │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  ServiceManager                                                   │
//! │  - shared CancellationToken (fired once on stop / signal)         │
//! │  - registration order (start ▲, stop ▼)                           │
//! │  - optional per-service stop timeout                              │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ publishes ServiceStarted / ServiceStopped / ShutdownComplete …
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                   Bus (broadcast channel, own seq)                │
//! │   ▲ CircuitBreaker publishes CircuitOpened / CallRejected …       │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                           SubscriberSet
//!                         (per-sub queues)
//!                       ┌─────────┼─────────┐
//!                       ▼         ▼         ▼
//!                   sub1.on   sub2.on   subN.on
//!                    _event()  _event()  _event()
//! ```
//!
//! ### Inside a service
//! ```text
//! Pipeline::source ─► stage ─► fan_out ─► [Semaphore / RateLimiter] ─► fan_in ─► sink
//!                                               │
//!                                   CircuitBreaker::call(retry(..))
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / functions                         |
//! |-------------------|---------------------------------------------------------------|-----------------------------------------------|
//! | **Streams**       | Cancellable stages, fan-out/fan-in, first value of many.      | [`Pipeline`], [`or_select`], [`first`]        |
//! | **Admission**     | Weighted permits, tick pacing, duplicate-call suppression.    | [`Semaphore`], [`RateLimiter`], [`Group`]     |
//! | **Failure**       | Trip on consecutive failures, retry with backoff.             | [`CircuitBreaker`], [`retry`], [`RetryPolicy`]|
//! | **Threads**       | Blocking FIFO for producer/consumer threads.                  | [`BoundedBuffer`]                             |
//! | **Lifecycle**     | Ordered start, one-shot cancellation, reverse stop.           | [`ServiceManager`], [`Service`], [`ServiceFn`]|
//! | **Subscriber API**| Observe lifecycle and breaker events.                         | [`Subscribe`], [`Bus`], [`Event`]             |
//! | **Errors**        | Typed errors with stable labels.                              | [`RuntimeError`], [`ServiceError`], …         |
//!
//! ## Optional features
//! - `logging`: exports a [`LogWriter`] subscriber that renders events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use flowguard::{Config, ServiceError, ServiceFn, ServiceManager};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mgr = ServiceManager::builder(Config {
//!         stop_timeout: Duration::from_secs(5),
//!         ..Config::default()
//!     })
//!     .build();
//!
//!     mgr.register(ServiceFn::arc("ticker", |token: CancellationToken| async move {
//!         let mut tick = tokio::time::interval(Duration::from_millis(10));
//!         loop {
//!             tokio::select! {
//!                 _ = token.cancelled() => return Ok::<(), ServiceError>(()),
//!                 _ = tick.tick() => {}
//!             }
//!         }
//!     }))?;
//!
//!     mgr.start().await?;
//!     tokio::time::sleep(Duration::from_millis(30)).await;
//!     mgr.stop().await?;
//!     Ok(())
//! }
//! ```
mod buffer;
mod core;
mod error;
mod events;
mod pipeline;
mod policies;
mod resilience;
mod services;
mod subscribers;

// ---- Public re-exports ----

pub use buffer::BoundedBuffer;
pub use self::core::{Config, ServiceManager, ServiceManagerBuilder};
pub use error::{AcquireError, BreakerError, RetryError, RuntimeError, ServiceError};
pub use events::{Bus, Event, EventKind};
pub use pipeline::{Pipeline, Sink, Stream, channel, first, or_select};
pub use policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
pub use resilience::{
    BreakerState, CircuitBreaker, CircuitBreakerConfig, Group, OwnedPermit, Permit, RateLimiter,
    Semaphore, retry, retry_if,
};
pub use services::{Service, ServiceFn, ServiceRef};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a tracing-backed logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
