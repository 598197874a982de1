//! # Service abstraction.
//!
//! A [`Service`] is a named, long-running unit managed by the
//! [`ServiceManager`](crate::ServiceManager). `start` spawns exactly one
//! managed task and returns immediately; `stop` waits until that task has
//! exited. The common handle type is [`ServiceRef`].
//!
//! ## Lifecycle
//! ```text
//! created ──start(token)──► started ──token fired──► stop-requested
//!                                                        │ task exits
//!                                                        ▼
//!                                              acknowledged-stopped
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ServiceError;

/// Shared handle to a service.
pub type ServiceRef = Arc<dyn Service>;

/// # Long-running, cancelable unit.
///
/// # Example
/// ```
/// use std::sync::Mutex;
/// use async_trait::async_trait;
/// use tokio::task::JoinHandle;
/// use tokio_util::sync::CancellationToken;
/// use flowguard::{Service, ServiceError};
///
/// #[derive(Default)]
/// struct Ticker {
///     join: Mutex<Option<JoinHandle<()>>>,
/// }
///
/// #[async_trait]
/// impl Service for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     fn start(&self, token: CancellationToken) -> Result<(), ServiceError> {
///         let mut join = self.join.lock().unwrap();
///         if join.is_some() {
///             return Err(ServiceError::AlreadyStarted { name: "ticker".into() });
///         }
///         *join = Some(tokio::spawn(async move { token.cancelled().await }));
///         Ok(())
///     }
///
///     async fn stop(&self) -> Result<(), ServiceError> {
///         let join = self.join.lock().unwrap().take();
///         match join {
///             Some(j) => j.await.map_err(|e| ServiceError::failed(e.to_string())),
///             None => Err(ServiceError::NotStarted { name: "ticker".into() }),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Returns a stable, human-readable service name.
    fn name(&self) -> &str;

    /// Spawns the managed task and returns without waiting for it.
    ///
    /// The task must exit promptly once `token` is cancelled.
    /// Fails with [`ServiceError::AlreadyStarted`] while a previous task is running.
    fn start(&self, token: CancellationToken) -> Result<(), ServiceError>;

    /// Waits until the managed task has exited.
    ///
    /// Returns the task's own failure, if any.
    async fn stop(&self) -> Result<(), ServiceError>;
}
