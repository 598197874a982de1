//! # Circuit breaker.
//!
//! Guards calls to an unreliable dependency. After `failure_threshold`
//! consecutive failures the breaker opens and rejects calls without running
//! them. Once `open_timeout` has passed since the last failure, calls are let
//! through as trials: a success closes the circuit, a failure reopens it.
//!
//! ```text
//!            failures >= threshold
//!   Closed ────────────────────────► Open
//!     ▲                               │ now - last_failure >= open_timeout
//!     │ success                       ▼
//!     └────────────────────────── HalfOpen ──── failure ───► Open
//! ```
//!
//! With [`CircuitBreakerConfig::single_probe`] set, only one trial call runs
//! at a time while `HalfOpen`; the rest are rejected until it finishes.
//!
//! State transitions are published on the optional [`Bus`] as
//! `CircuitOpened` / `CircuitHalfOpen` / `CircuitClosed`, rejections as
//! `CallRejected`.

use std::borrow::Cow;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::BreakerError;
use crate::events::{Bus, Event, EventKind};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls pass through; failures are counted.
    Closed,
    /// Calls are rejected until the open timeout elapses.
    Open,
    /// Trial calls decide whether to close or reopen.
    HalfOpen,
}

impl BreakerState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

/// Breaker settings.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Name used in events and logs.
    pub name: Cow<'static, str>,
    /// Consecutive failures that trip the breaker (`0` is treated as `1`).
    pub failure_threshold: u32,
    /// Time after the last failure before trial calls are allowed.
    pub open_timeout: Duration,
    /// Allow only one in-flight trial call while `HalfOpen`.
    pub single_probe: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed("breaker"),
            failure_threshold: 5,
            open_timeout: Duration::from_secs(30),
            single_probe: false,
        }
    }
}

struct Inner {
    state: BreakerState,
    failures: u32,
    last_failure: Option<Instant>,
    probing: bool,
}

/// Failure-counting gate around fallible async calls.
pub struct CircuitBreaker {
    cfg: CircuitBreakerConfig,
    inner: Mutex<Inner>,
    bus: Option<Bus>,
}

/// Marks an admitted call; clears the probe slot if the call is dropped early.
struct Trial<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
}

impl Drop for Trial<'_> {
    fn drop(&mut self) {
        if self.probe {
            self.breaker.lock().probing = false;
        }
    }
}

impl CircuitBreaker {
    /// Creates a closed breaker.
    pub fn new(mut cfg: CircuitBreakerConfig) -> Self {
        cfg.failure_threshold = cfg.failure_threshold.max(1);
        Self {
            cfg,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                failures: 0,
                last_failure: None,
                probing: false,
            }),
            bus: None,
        }
    }

    /// Publishes state transitions and rejections on `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Breaker name.
    pub fn name(&self) -> &str {
        &self.cfg.name
    }

    /// Current state as last recorded.
    ///
    /// An `Open` breaker whose timeout has elapsed reports `Open` until the
    /// next call moves it to `HalfOpen`.
    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    /// Consecutive failures since the last success.
    pub fn failure_count(&self) -> u32 {
        self.lock().failures
    }

    /// Runs `f` unless the circuit is open, and records its outcome.
    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let trial = self.admit()?;
        let res = f().await;
        self.record(res.is_ok(), &trial);
        drop(trial);
        res.map_err(BreakerError::Inner)
    }

    fn admit<E>(&self) -> Result<Trial<'_>, BreakerError<E>> {
        let now = Instant::now();
        let mut g = self.lock();

        let mut entered_half_open = false;
        if g.state == BreakerState::Open {
            let since = g
                .last_failure
                .map_or(self.cfg.open_timeout, |t| now.saturating_duration_since(t));
            if since < self.cfg.open_timeout {
                drop(g);
                return Err(self.reject(self.cfg.open_timeout - since));
            }
            g.state = BreakerState::HalfOpen;
            entered_half_open = true;
        }

        let mut probe = false;
        if g.state == BreakerState::HalfOpen && self.cfg.single_probe {
            if g.probing {
                drop(g);
                return Err(self.reject(Duration::ZERO));
            }
            g.probing = true;
            probe = true;
        }
        drop(g);

        if entered_half_open {
            tracing::debug!(breaker = %self.cfg.name, "circuit half-open");
            self.publish(EventKind::CircuitHalfOpen);
        }
        Ok(Trial {
            breaker: self,
            probe,
        })
    }

    fn record(&self, success: bool, trial: &Trial<'_>) {
        let mut g = self.lock();
        if trial.probe {
            g.probing = false;
        }

        let transition = if success {
            g.failures = 0;
            let was = std::mem::replace(&mut g.state, BreakerState::Closed);
            (was != BreakerState::Closed).then_some(EventKind::CircuitClosed)
        } else {
            g.failures = g.failures.saturating_add(1);
            g.last_failure = Some(Instant::now());
            let trip = match g.state {
                BreakerState::Closed => g.failures >= self.cfg.failure_threshold,
                BreakerState::HalfOpen => true,
                BreakerState::Open => false,
            };
            if trip {
                g.state = BreakerState::Open;
            }
            trip.then_some(EventKind::CircuitOpened)
        };
        let failures = g.failures;
        drop(g);

        match transition {
            Some(EventKind::CircuitOpened) => {
                tracing::warn!(breaker = %self.cfg.name, failures, "circuit opened");
                if let Some(bus) = &self.bus {
                    bus.publish(
                        Event::new(EventKind::CircuitOpened)
                            .with_source(&*self.cfg.name)
                            .with_reason(format!("{failures} consecutive failures")),
                    );
                }
            }
            Some(kind) => {
                tracing::debug!(breaker = %self.cfg.name, "circuit closed");
                self.publish(kind);
            }
            None => {}
        }
    }

    fn reject<E>(&self, remaining: Duration) -> BreakerError<E> {
        if let Some(bus) = &self.bus {
            bus.publish(
                Event::new(EventKind::CallRejected)
                    .with_source(&*self.cfg.name)
                    .with_timeout(remaining),
            );
        }
        BreakerError::Open { remaining }
    }

    fn publish(&self, kind: EventKind) {
        if let Some(bus) = &self.bus {
            bus.publish(Event::new(kind).with_source(&*self.cfg.name));
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.cfg.name)
            .field("state", &self.state())
            .field("failures", &self.failure_count())
            .finish()
    }
}
