//! # Weighted, cancellable semaphore.
//!
//! A [`Semaphore`] has a fixed capacity `N` and a held weight `h` with
//! `0 <= h <= N` at every observable point. Waiters are served in FIFO order
//! (backed by [`tokio::sync::Semaphore`]).
//!
//! ```text
//! acquire(token, w) ──► w > N?          ─► Err(WeightExceedsCapacity)
//!                   ──► token fired?    ─► Err(Cancelled)      (no state change)
//!                   ──► wait h + w <= N ─► h += w, Ok(Permit)
//!
//! drop(Permit)  / release(w) ──► h -= min(w, h)               (never blocks)
//! ```
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use flowguard::Semaphore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let sem = Semaphore::new(3);
//! let token = CancellationToken::new();
//!
//! let permit = sem.acquire(&token, 2).await.unwrap();
//! assert_eq!(sem.held(), 2);
//! assert!(sem.try_acquire(2).is_none());
//! drop(permit);
//! assert_eq!(sem.held(), 0);
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::Semaphore as Permits;
use tokio_util::sync::CancellationToken;

use crate::error::AcquireError;

/// Bounded concurrent-execution gate with weighted permits.
#[derive(Debug)]
pub struct Semaphore {
    permits: Permits,
    held: AtomicU32,
    capacity: u32,
}

impl Semaphore {
    /// Creates a semaphore with `capacity` units of weight.
    pub fn new(capacity: u32) -> Self {
        Self {
            permits: Permits::new(capacity as usize),
            held: AtomicU32::new(0),
            capacity,
        }
    }

    /// Fixed capacity.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Currently held weight.
    pub fn held(&self) -> u32 {
        self.held.load(Ordering::Acquire)
    }

    /// Waits until `weight` fits, or fails if `token` fires first.
    pub async fn acquire(
        &self,
        token: &CancellationToken,
        weight: u32,
    ) -> Result<Permit<'_>, AcquireError> {
        self.acquire_raw(token, weight).await?;
        Ok(Permit { sem: self, weight })
    }

    /// Like [`acquire`](Self::acquire), but gives up with [`AcquireError::Timeout`]
    /// after `timeout`.
    pub async fn acquire_timeout(
        &self,
        token: &CancellationToken,
        weight: u32,
        timeout: Duration,
    ) -> Result<Permit<'_>, AcquireError> {
        match tokio::time::timeout(timeout, self.acquire(token, weight)).await {
            Ok(res) => res,
            Err(_elapsed) => Err(AcquireError::Timeout { timeout }),
        }
    }

    /// Owned variant of [`acquire`](Self::acquire) for permits that move into spawned tasks.
    pub async fn acquire_owned(
        self: &Arc<Self>,
        token: &CancellationToken,
        weight: u32,
    ) -> Result<OwnedPermit, AcquireError> {
        self.acquire_raw(token, weight).await?;
        Ok(OwnedPermit {
            sem: Arc::clone(self),
            weight,
        })
    }

    /// Acquires `weight` only if it fits right now.
    pub fn try_acquire(&self, weight: u32) -> Option<Permit<'_>> {
        let permit = self.permits.try_acquire_many(weight).ok()?;
        permit.forget();
        self.held.fetch_add(weight, Ordering::AcqRel);
        Some(Permit { sem: self, weight })
    }

    /// Returns `weight` to the semaphore.
    ///
    /// Never blocks or fails. Releasing more than is held only returns what is held.
    pub fn release(&self, weight: u32) {
        let prev = self
            .held
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |h| {
                Some(h - weight.min(h))
            })
            .unwrap_or_else(|h| h);
        let returned = weight.min(prev);
        if returned < weight {
            tracing::debug!(weight, held = prev, "release clamped to held weight");
        }
        self.permits.add_permits(returned as usize);
    }

    async fn acquire_raw(
        &self,
        token: &CancellationToken,
        weight: u32,
    ) -> Result<(), AcquireError> {
        if weight > self.capacity {
            return Err(AcquireError::WeightExceedsCapacity {
                weight,
                capacity: self.capacity,
            });
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(AcquireError::Cancelled),
            res = self.permits.acquire_many(weight) => match res {
                Ok(permit) => {
                    permit.forget();
                    self.held.fetch_add(weight, Ordering::AcqRel);
                    Ok(())
                }
                Err(_closed) => Err(AcquireError::Cancelled),
            },
        }
    }
}

/// Held weight, released on drop.
#[must_use = "dropping the permit releases it immediately"]
#[derive(Debug)]
pub struct Permit<'a> {
    sem: &'a Semaphore,
    weight: u32,
}

impl Permit<'_> {
    /// Weight held by this permit.
    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Keeps the weight held without a guard; hand it back later with
    /// [`Semaphore::release`].
    pub fn detach(mut self) -> u32 {
        std::mem::take(&mut self.weight)
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.weight > 0 {
            self.sem.release(self.weight);
        }
    }
}

/// Owned counterpart of [`Permit`].
#[must_use = "dropping the permit releases it immediately"]
#[derive(Debug)]
pub struct OwnedPermit {
    sem: Arc<Semaphore>,
    weight: u32,
}

impl OwnedPermit {
    /// Weight held by this permit.
    pub fn weight(&self) -> u32 {
        self.weight
    }
}

impl Drop for OwnedPermit {
    fn drop(&mut self) {
        if self.weight > 0 {
            self.sem.release(self.weight);
        }
    }
}
