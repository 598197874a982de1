//! # Service manager configuration.
//!
//! Provides [`Config`], centralized settings for the [`ServiceManager`](crate::ServiceManager).
//!
//! ## Sentinel values
//! - `stop_timeout = 0s` → wait for every service indefinitely
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Configuration for the service manager.
///
/// ## Field semantics
/// - `stop_timeout`: Maximum wait for **each** service to acknowledge stop (`0s` = no limit)
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
///
/// All fields are public. Prefer the helper accessors over sprinkling sentinel checks.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for one service's stop acknowledgment.
    ///
    /// A service exceeding it is recorded as stuck and the manager moves on to the
    /// next one; `stop()` then returns `RuntimeError::GraceExceeded`.
    pub stop_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the per-service stop timeout as an `Option`.
    ///
    /// - `None` → wait indefinitely
    /// - `Some(d)` → give up on a service after `d`
    #[inline]
    pub fn stop_limit(&self) -> Option<Duration> {
        if self.stop_timeout == Duration::ZERO {
            None
        } else {
            Some(self.stop_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `stop_timeout = 0s` (every service gets as long as it needs)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            stop_timeout: Duration::ZERO,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels() {
        let mut cfg = Config::default();
        assert_eq!(cfg.stop_limit(), None);

        cfg.stop_timeout = Duration::from_millis(250);
        cfg.bus_capacity = 0;
        assert_eq!(cfg.stop_limit(), Some(Duration::from_millis(250)));
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
