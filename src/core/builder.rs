use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{config::Config, manager::ServiceManager};
use crate::{events::Bus, subscribers::Subscribe};

/// Builder for constructing a [`ServiceManager`] with optional features.
pub struct ServiceManagerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    bus: Option<Bus>,
    token: Option<CancellationToken>,
}

impl ServiceManagerBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            bus: None,
            token: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Shares an existing bus (e.g. one already handed to circuit breakers).
    ///
    /// By default the manager creates its own with `Config::bus_capacity`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Uses `token` as the shared shutdown token.
    ///
    /// Cancelling it from outside makes [`ServiceManager::run_until_signal`] begin shutdown.
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Builds the manager.
    ///
    /// Spawns subscriber workers and the bus listener when subscribers are
    /// configured, so it must be called inside a tokio runtime in that case.
    pub fn build(self) -> Arc<ServiceManager> {
        let bus = self
            .bus
            .unwrap_or_else(|| Bus::new(self.cfg.bus_capacity_clamped()));
        let token = self.token.unwrap_or_default();
        Arc::new(ServiceManager::new_internal(
            self.cfg,
            bus,
            self.subscribers,
            token,
        ))
    }
}
