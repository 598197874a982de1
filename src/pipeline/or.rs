//! # First-value selection across streams.
//!
//! [`or_select`] races any number of streams and yields the first value any of
//! them produces. After that the remaining receivers are dropped, so nothing
//! more is consumed from them. Dropping the output also releases every input.

use futures::future::select_all;

use super::stream::{Stream, channel};

/// Returns a stream carrying the first value produced by any of `streams`.
///
/// - no inputs: a stream that closes without producing;
/// - one input: that input, unchanged;
/// - more: a race; inputs that close empty drop out, and the output closes
///   empty if all of them do.
pub fn or_select<T>(mut streams: Vec<Stream<T>>) -> Stream<T>
where
    T: Send + 'static,
{
    if streams.len() == 1 {
        if let Some(only) = streams.pop() {
            return only;
        }
    }

    let (tx, rx) = channel(1);
    if streams.is_empty() {
        return rx;
    }
    tokio::spawn(async move {
        tokio::select! {
            won = race(streams) => {
                if let Some(value) = won {
                    let _ = tx.send(value).await;
                }
            }
            _ = tx.closed() => {
                tracing::trace!("or_select output dropped, releasing inputs");
            }
        }
    });
    rx
}

/// Awaits the first value produced by any of `streams`.
///
/// Returns `None` if every stream closes without producing.
pub async fn first<T>(streams: Vec<Stream<T>>) -> Option<T> {
    race(streams).await
}

async fn race<T>(mut streams: Vec<Stream<T>>) -> Option<T> {
    while !streams.is_empty() {
        let (value, idx, rest) = select_all(streams.iter_mut().map(|s| Box::pin(s.recv()))).await;
        drop(rest);
        match value {
            Some(value) => return Some(value),
            None => {
                streams.swap_remove(idx);
            }
        }
    }
    None
}
