//! # Fan-out / fan-in.
//!
//! ```text
//!                ┌─► worker 0 ─► Stream<B> ─┐
//! Stream<A> ─────┼─► worker 1 ─► Stream<B> ─┼──► fan_in ─► Stream<B>
//!   (shared)     └─► worker n ─► Stream<B> ─┘
//! ```
//!
//! Workers take turns on the shared input; each item goes to exactly one
//! worker. Items of different workers are not ordered relative to each other.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::stage::Pipeline;
use super::stream::{Stream, channel, recv_or_cancel, send_or_cancel};

impl Pipeline {
    /// Spreads `input` over `workers` tasks, each applying `f` and emitting to
    /// its own output stream.
    ///
    /// `workers == 0` returns no streams and drops `input`.
    pub fn fan_out<A, B, F, Fut>(&self, input: Stream<A>, workers: usize, f: F) -> Vec<Stream<B>>
    where
        A: Send + 'static,
        B: Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = B> + Send + 'static,
    {
        let shared = Arc::new(Mutex::new(input));
        let f = Arc::new(f);

        (0..workers)
            .map(|worker| {
                let (tx, rx) = channel(self.buffer);
                let token = self.token.clone();
                let (shared, f) = (Arc::clone(&shared), Arc::clone(&f));
                tokio::spawn(async move {
                    loop {
                        let next = tokio::select! {
                            biased;
                            _ = token.cancelled() => None,
                            item = async { shared.lock().await.recv().await } => item,
                        };
                        let Some(item) = next else { break };
                        if !send_or_cancel(&token, &tx, f(item).await).await {
                            break;
                        }
                    }
                    tracing::trace!(worker, "fan-out worker finished");
                });
                rx
            })
            .collect()
    }

    /// Merges `streams` into one. The output closes once every input has
    /// closed or the token fired.
    pub fn fan_in<T>(&self, streams: Vec<Stream<T>>) -> Stream<T>
    where
        T: Send + 'static,
    {
        let (tx, rx) = channel(self.buffer);
        for mut input in streams {
            let (tx, token) = (tx.clone(), self.token.clone());
            tokio::spawn(async move {
                while let Some(item) = recv_or_cancel(&token, &mut input).await {
                    if !send_or_cancel(&token, &tx, item).await {
                        break;
                    }
                }
            });
        }
        rx
    }
}
