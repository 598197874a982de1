//! # ServiceManager: ordered start, single cancellation, reverse-order stop.
//!
//! The [`ServiceManager`] owns an ordered list of [`Service`]s, one shared
//! [`CancellationToken`], the event [`Bus`] and (optionally) a [`SubscriberSet`].
//!
//! ## Key responsibilities
//! - start every registered service in registration order
//! - on shutdown, fire the shared token **once** and stop services in reverse order,
//!   waiting for each acknowledgment before moving to the next
//! - treat a single service's stop failure as non-fatal (logged + published)
//! - optionally bound each wait with [`Config::stop_timeout`]
//!
//! ## High-level architecture
//! ```text
//! register(A), register(B), register(C)
//!
//! start():
//!   A.start(token) ─► B.start(token) ─► C.start(token)      (each spawns one task)
//!        └─ failure at any step ─► stop the already started ones, return StartFailed
//!
//! stop():
//!   already requested? ─► return Ok(())  (token is not fired again)
//!   publish ShutdownRequested
//!   token.cancel()                        → every service observes cancellation
//!   C.stop().await ─► B.stop().await ─► A.stop().await
//!        │ Ok        → ServiceStopped
//!        │ Err       → ServiceStopFailed (logged, sequence continues)
//!        └ timeout   → ServiceStopTimeout (recorded as stuck, sequence continues)
//!   publish ShutdownComplete
//!   stuck non-empty → Err(GraceExceeded)
//! ```
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use flowguard::{Config, ServiceError, ServiceFn, ServiceManager};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = ServiceManager::builder(Config::default()).build();
//!
//!     manager.register(ServiceFn::arc("ticker", |token: CancellationToken| async move {
//!         while !token.is_cancelled() {
//!             tokio::select! {
//!                 _ = tokio::time::sleep(std::time::Duration::from_millis(10)) => {}
//!                 _ = token.cancelled() => {}
//!             }
//!         }
//!         Ok::<_, ServiceError>(())
//!     }))?;
//!
//!     manager.start().await?;
//!     manager.stop().await?;
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use super::{builder::ServiceManagerBuilder, config::Config, shutdown};
use crate::{
    error::{RuntimeError, ServiceError},
    events::{Bus, Event, EventKind},
    services::ServiceRef,
    subscribers::{Subscribe, SubscriberSet},
};

/// Coordinates named services sharing one cancellation token.
pub struct ServiceManager {
    cfg: Config,
    bus: Bus,
    subs: Option<Arc<SubscriberSet>>,
    token: CancellationToken,

    registered: Mutex<Vec<ServiceRef>>,
    running: Mutex<Vec<ServiceRef>>,
    started: AtomicBool,
    stop_requested: AtomicBool,
}

impl ServiceManager {
    /// Returns a builder for configuring the manager.
    pub fn builder(cfg: Config) -> ServiceManagerBuilder {
        ServiceManagerBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: Config,
        bus: Bus,
        subscribers: Vec<Arc<dyn Subscribe>>,
        token: CancellationToken,
    ) -> Self {
        let subs = if subscribers.is_empty() {
            None
        } else {
            let set = Arc::new(SubscriberSet::new(subscribers, bus.clone()));
            Self::subscriber_listener(&bus, Arc::clone(&set));
            Some(set)
        };

        Self {
            cfg,
            bus,
            subs,
            token,
            registered: Mutex::new(Vec::new()),
            running: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set (fire-and-forget).
    fn subscriber_listener(bus: &Bus, set: Arc<SubscriberSet>) {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    /// The shared shutdown token handed to every service.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// The event bus this manager publishes to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The manager's configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Number of subscribers attached to this manager.
    pub fn subscriber_count(&self) -> usize {
        self.subs.as_ref().map_or(0, |s| s.len())
    }

    /// Registered service names, in registration order.
    pub fn names(&self) -> Vec<String> {
        lock(&self.registered)
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    /// Appends a service to the start order.
    ///
    /// Fails with [`RuntimeError::Duplicate`] when the name is taken and with
    /// [`RuntimeError::AlreadyStarted`] once `start()` was called.
    pub fn register(&self, service: ServiceRef) -> Result<(), RuntimeError> {
        if self.started.load(Ordering::Acquire) {
            return Err(RuntimeError::AlreadyStarted);
        }
        let mut registered = lock(&self.registered);
        if registered.iter().any(|s| s.name() == service.name()) {
            return Err(RuntimeError::Duplicate {
                name: service.name().to_string(),
            });
        }
        self.bus
            .publish(Event::new(EventKind::ServiceRegistered).with_source(service.name()));
        registered.push(service);
        Ok(())
    }

    /// Starts every registered service in registration order.
    ///
    /// Each service spawns its task and returns immediately. If one fails to
    /// start, the services started before it are stopped (full shutdown) and
    /// [`RuntimeError::StartFailed`] is returned.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        if self.stop_requested.load(Ordering::Acquire) || self.started.swap(true, Ordering::AcqRel)
        {
            return Err(RuntimeError::AlreadyStarted);
        }

        let services = lock(&self.registered).clone();
        for svc in services {
            // checked under the `running` lock so a concurrent stop sees every started service
            let res = {
                let mut running = lock(&self.running);
                if self.stop_requested.load(Ordering::Acquire) || self.token.is_cancelled() {
                    break;
                }
                let res = svc.start(self.token.clone());
                if res.is_ok() {
                    self.bus
                        .publish(Event::new(EventKind::ServiceStarted).with_source(svc.name()));
                    running.push(Arc::clone(&svc));
                }
                res
            };
            if let Err(source) = res {
                let name = svc.name().to_string();
                tracing::warn!(service = %name, error = %source, "service failed to start");
                self.bus.publish(
                    Event::new(EventKind::ServiceStartFailed)
                        .with_source(name.as_str())
                        .with_reason(source.to_string()),
                );
                if let Err(e) = self.stop().await {
                    tracing::warn!(error = %e, "rollback after failed start was incomplete");
                }
                return Err(RuntimeError::StartFailed { name, source });
            }
        }
        Ok(())
    }

    /// Fires the shared token once, then stops services in reverse start order.
    ///
    /// Later calls return `Ok(())` immediately without firing the token again.
    /// A failing service is logged and published; the remaining services still
    /// get their stop. Returns [`RuntimeError::GraceExceeded`] when some
    /// services hit [`Config::stop_timeout`].
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        if self.stop_requested.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.token.cancel();

        let running = std::mem::take(&mut *lock(&self.running));
        let mut stuck = Vec::new();
        for svc in running.iter().rev() {
            if !self.stop_one(svc).await {
                stuck.push(svc.name().to_string());
            }
        }
        self.bus.publish(Event::new(EventKind::ShutdownComplete));

        if stuck.is_empty() {
            Ok(())
        } else {
            Err(RuntimeError::GraceExceeded {
                timeout: self.cfg.stop_timeout,
                stuck,
            })
        }
    }

    /// Stops one service; returns `false` if it did not acknowledge in time.
    async fn stop_one(&self, svc: &ServiceRef) -> bool {
        let name = svc.name();
        self.bus
            .publish(Event::new(EventKind::ServiceStopping).with_source(name));

        let res: Option<Result<(), ServiceError>> = match self.cfg.stop_limit() {
            Some(limit) => tokio::time::timeout(limit, svc.stop()).await.ok(),
            None => Some(svc.stop().await),
        };

        match res {
            Some(Ok(())) => {
                self.bus
                    .publish(Event::new(EventKind::ServiceStopped).with_source(name));
                true
            }
            Some(Err(e)) => {
                tracing::warn!(service = name, error = %e, "service stop failed");
                self.bus.publish(
                    Event::new(EventKind::ServiceStopFailed)
                        .with_source(name)
                        .with_reason(e.to_string()),
                );
                true
            }
            None => {
                tracing::warn!(
                    service = name,
                    timeout = ?self.cfg.stop_timeout,
                    "service stop timed out"
                );
                self.bus.publish(
                    Event::new(EventKind::ServiceStopTimeout)
                        .with_source(name)
                        .with_timeout(self.cfg.stop_timeout),
                );
                false
            }
        }
    }

    /// Starts all services, waits for a termination signal or for the shared
    /// token to be cancelled, then runs [`stop`](Self::stop).
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        self.start().await?;
        tokio::select! {
            res = shutdown::wait_for_shutdown_signal() => {
                if let Err(e) = res {
                    tracing::warn!(error = %e, "signal registration failed; waiting for token");
                    self.token.cancelled().await;
                }
            }
            _ = self.token.cancelled() => {}
        }
        self.stop().await
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
