//! Service lifecycle core.
//!
//! The public API from this module is [`ServiceManager`] (plus its builder and
//! [`Config`]), which starts registered services, fires one shared
//! cancellation token on shutdown and stops services in reverse order.
//!
//! Internal modules:
//! - [`manager`]: ordered start, one-shot cancellation, reverse stop;
//! - [`builder`]: wires bus, subscribers and the shared token;
//! - [`config`]: stop timeout and bus sizing;
//! - [`shutdown`]: cross-platform termination-signal handling.

mod builder;
mod config;
mod manager;
mod shutdown;

pub use builder::ServiceManagerBuilder;
pub use config::Config;
pub use manager::ServiceManager;
