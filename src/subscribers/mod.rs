//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`]
//! that drives subscribers for events broadcast through the [`Bus`](crate::Bus).
//!
//! ```text
//! ServiceManager / CircuitBreaker ── publish(Event) ──► Bus ──► listener
//!                                                                 │
//!                                                          SubscriberSet::emit
//!                                                     ┌───────────┼───────────┐
//!                                                     ▼           ▼           ▼
//!                                                 LogWriter    Metrics     Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use flowguard::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct TripCounter;
//!
//! #[async_trait]
//! impl Subscribe for TripCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::CircuitOpened {
//!             // increment counter
//!         }
//!     }
//!     fn name(&self) -> &'static str { "trip-counter" }
//! }
//! ```

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_message;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
