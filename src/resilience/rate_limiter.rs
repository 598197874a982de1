//! # Tick-paced request processing.
//!
//! [`RateLimiter::wrap`] spawns one task that pulls requests from an input
//! stream and runs the handler only when a token is available. Tokens are
//! added one per tick of a period-`interval` timer, up to `burst`.
//!
//! ```text
//! input ──► [wait token] ──► f(req).await ──► [wait gap] ──► output
//!              ▲                                  ▲
//!   tick every `interval`              last emission + `interval`
//!   (+1 token, capped at burst)        (burst = 1 only)
//! ```
//!
//! #### Rules
//! - Default (`burst = 1`, no initial token): no two requests start less than
//!   `interval` apart, and no two results are emitted less than `interval`
//!   apart even when `f` takes a variable time.
//! - Closing the input drains queued requests at the same pace, then closes
//!   the output.
//! - Cancellation closes the output without draining.

use std::future::Future;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::pipeline::{Stream, channel, send_or_cancel};

/// Paces a stream of requests to one per interval.
#[derive(Clone, Copy, Debug)]
pub struct RateLimiter {
    interval: Duration,
    burst: u32,
    initial: u32,
    buffer: usize,
}

impl RateLimiter {
    /// One request per `interval`, starting after the first tick.
    ///
    /// A zero interval is raised to one millisecond.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            burst: 1,
            initial: 0,
            buffer: 16,
        }
    }

    /// Up to `burst` requests back to back, refilled one per `interval`.
    /// Starts with all `burst` tokens available.
    pub fn with_burst(interval: Duration, burst: u32) -> Self {
        let burst = burst.max(1);
        Self {
            burst,
            initial: burst,
            ..Self::new(interval)
        }
    }

    /// Output channel capacity (minimum 1).
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }

    /// Tick period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Maximum banked tokens.
    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Processes `input` through `f` at the configured pace.
    pub fn wrap<Req, Resp, F, Fut>(
        &self,
        token: &CancellationToken,
        mut input: Stream<Req>,
        mut f: F,
    ) -> Stream<Resp>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
        F: FnMut(Req) -> Fut + Send + 'static,
        Fut: Future<Output = Resp> + Send + 'static,
    {
        let (tx, rx) = channel(self.buffer);
        let token = token.clone();
        let Self {
            interval,
            burst,
            initial,
            ..
        } = *self;

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tokens = initial;
            let mut next_emit: Option<Instant> = None;

            loop {
                let req = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick(), if tokens < burst => {
                        tokens += 1;
                        continue;
                    }
                    req = input.recv() => match req {
                        Some(req) => req,
                        None => break,
                    },
                };

                if tokens == 0 {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => {}
                    }
                } else {
                    if tokens == burst {
                        // refill starts counting from the first spend
                        ticker.reset();
                    }
                    tokens -= 1;
                }

                let resp = f(req).await;
                if let Some(at) = next_emit {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = time::sleep_until(at) => {}
                    }
                }
                if !send_or_cancel(&token, &tx, resp).await {
                    break;
                }
                if burst == 1 {
                    next_emit = Some(Instant::now() + interval);
                }
            }
            tracing::trace!("rate limiter finished");
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requests(n: u32) -> Stream<u32> {
        let (tx, rx) = channel(n as usize);
        for i in 0..n {
            tx.try_send(i).unwrap();
        }
        rx
    }

    async fn timed<T>(mut out: Stream<T>) -> Vec<(T, Instant)> {
        let mut got = Vec::new();
        while let Some(v) = out.recv().await {
            got.push((v, Instant::now()));
        }
        got
    }

    #[tokio::test(start_paused = true)]
    async fn emissions_are_spaced_by_interval() {
        let start = Instant::now();
        let d = Duration::from_millis(100);
        let limiter = RateLimiter::new(d);
        let out = limiter.wrap(&CancellationToken::new(), requests(5), |n| async move { n * 10 });

        let got = timed(out).await;
        let values: Vec<u32> = got.iter().map(|(v, _)| *v).collect();
        assert_eq!(values, vec![0, 10, 20, 30, 40]);

        assert!(got[0].1 - start >= d);
        for pair in got.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= d, "{:?}", pair[1].1 - pair[0].1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_handler_does_not_bunch_emissions() {
        let d = Duration::from_millis(100);
        let limiter = RateLimiter::new(d);
        let out = limiter.wrap(&CancellationToken::new(), requests(4), |n| async move {
            if n % 2 == 0 {
                tokio::time::sleep(Duration::from_millis(90)).await;
            }
            n
        });

        let got = timed(out).await;
        let values: Vec<u32> = got.iter().map(|(v, _)| *v).collect();
        assert_eq!(values, vec![0, 1, 2, 3]);
        for pair in got.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= d, "{:?}", pair[1].1 - pair[0].1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_passes_then_paces() {
        let start = Instant::now();
        let d = Duration::from_millis(100);
        let limiter = RateLimiter::with_burst(d, 3);
        let out = limiter.wrap(&CancellationToken::new(), requests(5), |n| async move { n });

        let got = timed(out).await;
        assert_eq!(got.len(), 5);
        for (_, at) in &got[..3] {
            assert!(*at - start < d);
        }
        assert!(got[3].1 - start >= d);
        assert!(got[4].1 - got[3].1 >= d);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_closes_without_draining() {
        let token = CancellationToken::new();
        let limiter = RateLimiter::new(Duration::from_secs(1));
        let mut out = limiter.wrap(&token, requests(10), |n| async move { n });

        assert_eq!(out.recv().await, Some(0));
        token.cancel();
        let rest = timed(out).await;
        assert!(rest.len() <= 1);
    }

    #[test]
    fn zero_interval_is_raised() {
        assert_eq!(RateLimiter::new(Duration::ZERO).interval(), Duration::from_millis(1));
        assert_eq!(RateLimiter::with_burst(Duration::ZERO, 0).burst(), 1);
    }
}
