//! # Pipeline stages.
//!
//! A [`Pipeline`] carries the cancellation token and channel buffer shared by
//! every stage it builds. Each stage is one spawned task:
//!
//! ```text
//! source(iter) ─► Stream<A> ─► stage(f) ─► Stream<B> ─► stage(g) ─► Stream<C>
//!                                 │                        │
//!                          token fired / input closed ─► output closed
//! ```
//!
//! Closing propagates forward: when a stage exits, its output closes, so
//! the next stage sees end of input and exits too.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use flowguard::Pipeline;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pipe = Pipeline::new(CancellationToken::new());
//! let nums = pipe.source(1..=6);
//! let evens = pipe.stage(nums, |n: u32| async move { (n % 2 == 0).then_some(n) });
//! let mut squares = pipe.map(evens, |n| async move { n * n });
//!
//! let mut got = Vec::new();
//! while let Some(v) = squares.recv().await {
//!     got.push(v);
//! }
//! assert_eq!(got, vec![4, 16, 36]);
//! # }
//! ```

use std::future::Future;

use tokio_util::sync::CancellationToken;

use super::stream::{Stream, channel, recv_or_cancel, send_or_cancel};

/// Shared settings for building stages.
#[derive(Clone, Debug)]
pub struct Pipeline {
    pub(super) token: CancellationToken,
    pub(super) buffer: usize,
}

impl Pipeline {
    /// Channel capacity used between stages unless overridden.
    pub const DEFAULT_BUFFER: usize = 16;

    /// Creates a pipeline whose stages stop when `token` fires.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            buffer: Self::DEFAULT_BUFFER,
        }
    }

    /// Sets the channel capacity between stages (minimum 1).
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    /// Token shared by all stages.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Emits every item of `items`, then closes.
    pub fn source<I>(&self, items: I) -> Stream<I::Item>
    where
        I: IntoIterator,
        I::IntoIter: Send + 'static,
        I::Item: Send + 'static,
    {
        let (tx, rx) = channel(self.buffer);
        let token = self.token.clone();
        let items = items.into_iter();
        tokio::spawn(async move {
            for item in items {
                if !send_or_cancel(&token, &tx, item).await {
                    break;
                }
            }
        });
        rx
    }

    /// Applies `f` to every input item, forwarding the `Some` results.
    pub fn stage<A, B, F, Fut>(&self, mut input: Stream<A>, mut f: F) -> Stream<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        F: FnMut(A) -> Fut + Send + 'static,
        Fut: Future<Output = Option<B>> + Send + 'static,
    {
        let (tx, rx) = channel(self.buffer);
        let token = self.token.clone();
        tokio::spawn(async move {
            while let Some(item) = recv_or_cancel(&token, &mut input).await {
                let Some(out) = f(item).await else {
                    continue;
                };
                if !send_or_cancel(&token, &tx, out).await {
                    break;
                }
            }
            tracing::trace!("pipeline stage finished");
        });
        rx
    }

    /// Non-filtering [`stage`](Self::stage).
    pub fn map<A, B, F, Fut>(&self, input: Stream<A>, mut f: F) -> Stream<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        F: FnMut(A) -> Fut + Send + 'static,
        Fut: Future<Output = B> + Send + 'static,
    {
        self.stage(input, move |item| {
            let fut = f(item);
            async move { Some(fut.await) }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn collect<T>(mut rx: Stream<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(v) = rx.recv().await {
            out.push(v);
        }
        out
    }

    #[tokio::test]
    async fn stages_compose_in_order() {
        let pipe = Pipeline::new(CancellationToken::new()).with_buffer(2);
        let words = pipe.source(vec!["a", "", "bc", "def"]);
        let non_empty = pipe.stage(words, |w| async move { (!w.is_empty()).then_some(w) });
        let lengths = pipe.map(non_empty, |w| async move { w.len() });
        assert_eq!(collect(lengths).await, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_closes_every_stage() {
        let token = CancellationToken::new();
        let pipe = Pipeline::new(token.clone()).with_buffer(1);
        let endless = pipe.source(0u64..);
        let slow = pipe.map(endless, |n| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            n
        });
        let mut out = pipe.map(slow, |n| async move { n + 1 });

        assert_eq!(out.recv().await, Some(1));
        token.cancel();

        let rest = tokio::time::timeout(Duration::from_secs(1), collect(out))
            .await
            .expect("pipeline did not close after cancellation");
        assert!(rest.len() <= 2, "drained {} items after cancel", rest.len());
    }

    #[tokio::test]
    async fn dropped_consumer_stops_upstream() {
        let pipe = Pipeline::new(CancellationToken::new());
        let (seen_tx, mut seen_rx) = tokio::sync::mpsc::unbounded_channel();
        let src = pipe.source(0..1_000);
        let out = pipe.stage(src, move |n: i32| {
            let seen_tx = seen_tx.clone();
            async move {
                let _ = seen_tx.send(n);
                Some(n)
            }
        });
        drop(out);

        let mut count = 0;
        while seen_rx.recv().await.is_some() {
            count += 1;
        }
        assert!(count < 1_000);
    }
}
