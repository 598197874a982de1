//! Channel aliases and cancellation-aware send/receive helpers shared by
//! every stage.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Receiving end of a stage. Closed when every upstream sender is gone.
pub type Stream<T> = mpsc::Receiver<T>;

/// Sending end of a stage.
pub type Sink<T> = mpsc::Sender<T>;

/// Creates a stage channel holding up to `buffer` items (minimum 1).
pub fn channel<T>(buffer: usize) -> (Sink<T>, Stream<T>) {
    mpsc::channel(buffer.max(1))
}

/// Sends `item` unless `token` fires first. Returns `false` if the item was
/// not delivered (cancelled, or the receiver is gone).
pub(crate) async fn send_or_cancel<T>(token: &CancellationToken, tx: &Sink<T>, item: T) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        res = tx.send(item) => res.is_ok(),
    }
}

/// Receives the next item unless `token` fires first.
pub(crate) async fn recv_or_cancel<T>(token: &CancellationToken, rx: &mut Stream<T>) -> Option<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        item = rx.recv() => item,
    }
}
