//! # Duplicate-call suppression.
//!
//! [`Group::call`] makes sure only one execution per key is in flight. Callers
//! that arrive while it runs wait for it and share its result.
//!
//! ```text
//! call(k, f) ──► no entry for k ──► leader: insert entry, run f
//!                                      │
//!                                      ├─► publish result to waiters
//!                                      └─► remove entry ─► (result, shared = false)
//!            ──► entry for k    ──► waiter: await leader ─► (result, shared = true)
//! ```
//!
//! #### Notes
//! - The entry is removed once the leader finishes, so a later call starts a
//!   new execution.
//! - If the leader is dropped before finishing, its waiters contend again and
//!   one of them runs its own `f`.
//! - [`Group::forget`] detaches the in-flight entry so the next call starts
//!   fresh; callers already waiting still get the old result.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

type Slot<T, E> = Option<Result<T, E>>;

struct InFlight<T, E> {
    id: u64,
    rx: watch::Receiver<Slot<T, E>>,
}

enum Role<T, E> {
    Lead(watch::Sender<Slot<T, E>>, u64),
    Wait(watch::Receiver<Slot<T, E>>),
}

/// Keyed de-duplication of concurrent calls.
pub struct Group<K, T, E> {
    calls: Mutex<HashMap<K, InFlight<T, E>>>,
    next_id: AtomicU64,
}

impl<K, T, E> Default for Group<K, T, E> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<K, T, E> Group<K, T, E>
where
    K: Eq + Hash + Clone,
    T: Clone,
    E: Clone,
{
    /// Creates an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` for `key` unless a call for `key` is already in flight, in which
    /// case the in-flight result is awaited and returned.
    ///
    /// The boolean is `true` when the result came from another caller's execution.
    pub async fn call<F, Fut>(&self, key: K, f: F) -> (Result<T, E>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let (tx, id) = loop {
            let mut rx = match self.enter(&key) {
                Role::Lead(tx, id) => break (tx, id),
                Role::Wait(rx) => rx,
            };
            let got = match rx.wait_for(Option::is_some).await {
                Ok(slot) => (*slot).clone(),
                Err(_) => None,
            };
            if let Some(res) = got {
                return (res, true);
            }
            tracing::trace!("single-flight leader abandoned its call, contending again");
        };

        let leader = Leader {
            group: self,
            key: &key,
            id,
        };
        let res = f().await;
        let shared_with = tx.receiver_count().saturating_sub(1);
        tx.send_replace(Some(res.clone()));
        drop(leader);
        tracing::trace!(shared_with, "single-flight call finished");
        (res, false)
    }

    /// Detaches any in-flight call for `key`.
    pub fn forget(&self, key: &K) {
        self.lock().remove(key);
    }

    /// Number of keys with a call in flight.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn enter(&self, key: &K) -> Role<T, E> {
        let mut calls = self.lock();
        if let Some(call) = calls.get(key) {
            return Role::Wait(call.rx.clone());
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        calls.insert(key.clone(), InFlight { id, rx });
        Role::Lead(tx, id)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, InFlight<T, E>>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes the leader's entry when it finishes or is dropped, unless the entry
/// was forgotten and replaced in the meantime.
struct Leader<'a, K: Eq + Hash, T, E> {
    group: &'a Group<K, T, E>,
    key: &'a K,
    id: u64,
}

impl<K: Eq + Hash, T, E> Drop for Leader<'_, K, T, E> {
    fn drop(&mut self) {
        let mut calls = self
            .group
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if calls.get(self.key).is_some_and(|c| c.id == self.id) {
            calls.remove(self.key);
        }
    }
}

impl<K, T, E> std::fmt::Debug for Group<K, T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Group").field("in_flight", &len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    type Calls = Group<&'static str, String, String>;

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_execution() {
        let group = Arc::new(Calls::new());
        let runs = Arc::new(AtomicUsize::new(0));

        let mut set = tokio::task::JoinSet::new();
        for _ in 0..5 {
            let (group, runs) = (group.clone(), runs.clone());
            set.spawn(async move {
                group
                    .call("k", || async move {
                        runs.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok("v".to_string())
                    })
                    .await
            });
        }

        let mut leaders = 0;
        while let Some(res) = set.join_next().await {
            let (value, shared) = res.unwrap();
            assert_eq!(value.as_deref(), Ok("v"));
            if !shared {
                leaders += 1;
            }
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(leaders, 1);
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn errors_are_shared_and_entry_is_cleared() {
        let group = Calls::new();
        let (res, shared) = group.call("k", || async { Err("down".to_string()) }).await;
        assert_eq!(res, Err("down".to_string()));
        assert!(!shared);

        let (res, _) = group.call("k", || async { Ok("up".to_string()) }).await;
        assert_eq!(res.as_deref(), Ok("up"));
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_keys_run_independently() {
        let group = Arc::new(Calls::new());
        let a = {
            let group = group.clone();
            tokio::spawn(async move {
                group
                    .call("a", || async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok("a".to_string())
                    })
                    .await
            })
        };
        let (b, shared) = group.call("b", || async { Ok("b".to_string()) }).await;
        assert_eq!(b.as_deref(), Ok("b"));
        assert!(!shared);
        assert_eq!(a.await.unwrap().0.as_deref(), Ok("a"));
    }

    #[tokio::test(start_paused = true)]
    async fn forget_starts_a_fresh_execution() {
        let group = Arc::new(Calls::new());
        let slow = {
            let group = group.clone();
            tokio::spawn(async move {
                group
                    .call("k", || async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok("old".to_string())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        assert_eq!(group.in_flight(), 1);

        group.forget(&"k");
        let (fresh, shared) = group.call("k", || async { Ok("new".to_string()) }).await;
        assert_eq!(fresh.as_deref(), Ok("new"));
        assert!(!shared);
        assert_eq!(slow.await.unwrap().0.as_deref(), Ok("old"));
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_take_over_when_leader_is_dropped() {
        let group = Arc::new(Calls::new());
        let leader = {
            let group = group.clone();
            tokio::spawn(async move {
                group
                    .call("k", || std::future::pending::<Result<String, String>>())
                    .await
            })
        };
        tokio::task::yield_now().await;

        let waiter = {
            let group = group.clone();
            tokio::spawn(async move { group.call("k", || async { Ok("mine".to_string()) }).await })
        };
        tokio::task::yield_now().await;
        leader.abort();

        let (res, shared) = waiter.await.unwrap();
        assert_eq!(res.as_deref(), Ok("mine"));
        assert!(!shared);
    }
}
