//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (service manager,
//! circuit breakers, subscriber workers).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                    Subscriber (one):
//!   ServiceManager ──┐
//!   CircuitBreaker ──┼──────► Bus ───────► listener ────► SubscriberSet
//!   SubscriberSet  ──┘  (broadcast chan)   (in ServiceManager)
//! ```
//!
//! ## Rules
//! - **Explicit ownership**: a bus is constructed and handed to whoever publishes;
//!   there is no process-wide instance. Its sequence counter lives inside it.
//! - **Non-blocking publish**: `publish()` never blocks; it calls `broadcast::Sender::send`.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active subscribers at send time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately (send clones internally).
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: clones share the sender and the sequence counter.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
    seq: Arc<AtomicU64>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self {
            tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Stamps the next sequence number onto `ev` and publishes it.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, mut ev: Event) {
        ev.seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    ///
    /// - Each call creates an **independent** receiver.
    /// - A receiver only gets events **sent after** it subscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn sequence_is_per_bus_and_monotonic() {
        let a = Bus::new(8);
        let b = Bus::new(8);
        let mut ra = a.subscribe();
        let mut rb = b.subscribe();

        a.publish(Event::new(EventKind::ShutdownRequested));
        a.clone().publish(Event::new(EventKind::ShutdownComplete));
        b.publish(Event::new(EventKind::ShutdownRequested));

        assert_eq!(ra.recv().await.unwrap().seq, 0);
        assert_eq!(ra.recv().await.unwrap().seq, 1);
        assert_eq!(rb.recv().await.unwrap().seq, 0);
    }

    #[test]
    fn publish_without_receivers_is_silent() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::ShutdownRequested));
    }
}
