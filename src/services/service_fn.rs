//! # Function-backed service (`ServiceFn`)
//!
//! [`ServiceFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a
//! fresh future per start and spawning it as the service's one managed task.
//!
//! ## Semantics
//! - `start` derives a **child token** from the given one and hands it to the closure,
//!   so `stop` can cancel this service alone without touching siblings.
//! - `stop` cancels the child token and awaits the task. A closure returning
//!   [`ServiceError::Canceled`] counts as a clean exit; a panic is reported as
//!   [`ServiceError::Panicked`].
//! - While a stop is awaiting the task, `start` is rejected with
//!   [`ServiceError::AlreadyStarted`] and a concurrent `stop` returns at once.
//! - After a stop completes, the service may be started again.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use flowguard::{ServiceError, ServiceFn, ServiceRef};
//!
//! let svc: ServiceRef = ServiceFn::arc("worker", |token: CancellationToken| async move {
//!     token.cancelled().await;
//!     Ok::<_, ServiceError>(())
//! });
//! assert_eq!(svc.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;
use crate::services::service::Service;
use crate::subscribers::panic_message;

enum State {
    Idle,
    Running {
        join: JoinHandle<Result<(), ServiceError>>,
        cancel: CancellationToken,
    },
    Stopping,
    Stopped,
}

/// Function-backed service implementation.
pub struct ServiceFn<F> {
    name: Cow<'static, str>,
    f: F,
    state: Mutex<State>,
}

impl<F> ServiceFn<F> {
    /// Creates a new function-backed service.
    ///
    /// Prefer [`ServiceFn::arc`] when you immediately need a [`ServiceRef`](crate::ServiceRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            state: Mutex::new(State::Idle),
        }
    }

    /// Creates the service and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// True while a managed task is spawned and not yet stopped.
    pub fn is_running(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(*state, State::Running { .. })
    }
}

#[async_trait]
impl<F, Fut> Service for ServiceFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, token: CancellationToken) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, State::Running { .. } | State::Stopping) {
            return Err(ServiceError::AlreadyStarted {
                name: self.name.to_string(),
            });
        }

        let cancel = token.child_token();
        let join = tokio::spawn((self.f)(cancel.clone()));
        *state = State::Running { join, cancel };
        Ok(())
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        let prev = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            match *state {
                State::Idle => {
                    return Err(ServiceError::NotStarted {
                        name: self.name.to_string(),
                    });
                }
                State::Stopping | State::Stopped => return Ok(()),
                State::Running { .. } => std::mem::replace(&mut *state, State::Stopping),
            }
        };
        let State::Running { join, cancel } = prev else {
            return Ok(());
        };

        cancel.cancel();
        let res = join.await;
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = State::Stopped;
        match res {
            Ok(Ok(())) | Ok(Err(ServiceError::Canceled)) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(je) if je.is_panic() => Err(ServiceError::Panicked {
                name: self.name.to_string(),
                reason: panic_message(je.into_panic().as_ref()),
            }),
            Err(_) => Err(ServiceError::Canceled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn start_twice_is_rejected_until_stopped() {
        let svc = ServiceFn::new("loop", |token: CancellationToken| async move {
            token.cancelled().await;
            Ok::<_, ServiceError>(())
        });
        let token = CancellationToken::new();

        svc.start(token.clone()).unwrap();
        assert!(svc.is_running());
        assert_eq!(
            svc.start(token.clone()),
            Err(ServiceError::AlreadyStarted {
                name: "loop".into()
            })
        );

        svc.stop().await.unwrap();
        assert!(!svc.is_running());
        assert!(!token.is_cancelled(), "stop cancels only the child token");

        svc.start(token.clone()).unwrap();
        token.cancel();
        svc.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_before_start_fails_and_second_stop_is_noop() {
        let svc = ServiceFn::new("idle", |_token: CancellationToken| async {
            Ok::<_, ServiceError>(())
        });
        assert!(matches!(
            svc.stop().await,
            Err(ServiceError::NotStarted { .. })
        ));

        svc.start(CancellationToken::new()).unwrap();
        svc.stop().await.unwrap();
        svc.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_reports_failure_and_panic() {
        let failing = ServiceFn::new("failing", |_token: CancellationToken| async {
            Err::<(), _>(ServiceError::failed("disk full"))
        });
        failing.start(CancellationToken::new()).unwrap();
        assert_eq!(failing.stop().await, Err(ServiceError::failed("disk full")));

        let panicking = ServiceFn::new("panicking", |_token: CancellationToken| async {
            if true {
                panic!("kaboom");
            }
            Ok::<_, ServiceError>(())
        });
        panicking.start(CancellationToken::new()).unwrap();
        assert_eq!(
            panicking.stop().await,
            Err(ServiceError::Panicked {
                name: "panicking".into(),
                reason: "kaboom".into()
            })
        );
    }

    #[tokio::test]
    async fn canceled_exit_counts_as_clean() {
        let exited = Arc::new(AtomicBool::new(false));
        let flag = exited.clone();
        let svc = ServiceFn::new("graceful", move |token: CancellationToken| {
            let flag = flag.clone();
            async move {
                token.cancelled().await;
                flag.store(true, Ordering::SeqCst);
                Err::<(), _>(ServiceError::Canceled)
            }
        });
        svc.start(CancellationToken::new()).unwrap();
        svc.stop().await.unwrap();
        assert!(exited.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn start_is_rejected_while_stop_waits_for_task() {
        let live = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (l, p) = (live.clone(), peak.clone());
        let svc = ServiceFn::arc("lingering", move |token: CancellationToken| {
            let (live, peak) = (l.clone(), p.clone());
            async move {
                let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                token.cancelled().await;
                tokio::time::sleep(Duration::from_millis(100)).await;
                live.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, ServiceError>(())
            }
        });
        let token = CancellationToken::new();
        svc.start(token.clone()).unwrap();
        tokio::task::yield_now().await;

        let stopping = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.stop().await })
        };
        tokio::task::yield_now().await;

        assert_eq!(
            svc.start(token.clone()),
            Err(ServiceError::AlreadyStarted {
                name: "lingering".into()
            })
        );
        assert_eq!(svc.stop().await, Ok(()), "concurrent stop returns at once");
        assert_eq!(live.load(Ordering::SeqCst), 1);

        stopping.await.unwrap().unwrap();
        assert_eq!(live.load(Ordering::SeqCst), 0);

        svc.start(token.clone()).unwrap();
        svc.stop().await.unwrap();
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
