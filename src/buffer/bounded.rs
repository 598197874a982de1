//! # Blocking FIFO buffer for threads.
//!
//! [`BoundedBuffer`] is a queue guarded by a mutex and two condition
//! variables. Consumers block while it is empty; with a capacity, producers
//! block while it is full. Every wake re-checks the condition, so spurious
//! wakeups are harmless.
//!
//! This is a thread primitive: calling the blocking methods from an async
//! task blocks the executor thread.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use flowguard::BoundedBuffer;
//!
//! let buf = Arc::new(BoundedBuffer::with_capacity(2));
//! let producer = {
//!     let buf = Arc::clone(&buf);
//!     std::thread::spawn(move || (0..5).for_each(|i| buf.put(i)))
//! };
//! let got: Vec<i32> = (0..5).map(|_| buf.get()).collect();
//! producer.join().unwrap();
//! assert_eq!(got, vec![0, 1, 2, 3, 4]);
//! ```

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Mutex + condition variable producer/consumer queue.
#[derive(Debug)]
pub struct BoundedBuffer<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: Option<usize>,
}

impl<T> Default for BoundedBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BoundedBuffer<T> {
    /// Unbounded buffer: `put` never blocks.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity: None,
        }
    }

    /// Buffer holding at most `capacity` items (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    /// Appends `item`, waiting for room if the buffer is full.
    pub fn put(&self, item: T) {
        let mut items = self.lock();
        if let Some(cap) = self.capacity {
            while items.len() >= cap {
                items = self.not_full.wait(items).unwrap_or_else(PoisonError::into_inner);
            }
        }
        items.push_back(item);
        drop(items);
        self.not_empty.notify_one();
    }

    /// Removes the oldest item, waiting while the buffer is empty.
    pub fn get(&self) -> T {
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                drop(items);
                self.not_full.notify_one();
                return item;
            }
            items = self.not_empty.wait(items).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Removes the oldest item if there is one.
    pub fn try_get(&self) -> Option<T> {
        let item = self.lock().pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Like [`get`](Self::get), but gives up after `timeout`.
    pub fn get_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.lock();
        loop {
            if let Some(item) = items.pop_front() {
                drop(items);
                self.not_full.notify_one();
                return Some(item);
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return None;
            }
            items = self
                .not_empty
                .wait_timeout(items, left)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Items currently queued.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Configured capacity, `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fifo_order() {
        let buf = BoundedBuffer::new();
        for c in ["a", "b", "c"] {
            buf.put(c);
        }
        assert_eq!(buf.len(), 3);
        assert_eq!((buf.get(), buf.get(), buf.get()), ("a", "b", "c"));
        assert!(buf.is_empty());
    }

    #[test]
    fn fifo_across_consumer_threads() {
        let buf = Arc::new(BoundedBuffer::new());
        for i in 1..=3 {
            buf.put(i);
        }
        let got: Vec<i32> = (0..3)
            .map(|_| {
                let buf = Arc::clone(&buf);
                thread::spawn(move || buf.get()).join().unwrap()
            })
            .collect();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[test]
    fn get_blocks_until_put() {
        let buf = Arc::new(BoundedBuffer::new());
        let consumer = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || buf.get())
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!consumer.is_finished());

        buf.put(42);
        assert_eq!(consumer.join().unwrap(), 42);
    }

    #[test]
    fn each_item_goes_to_exactly_one_consumer() {
        let buf = Arc::new(BoundedBuffer::with_capacity(4));
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let buf = Arc::clone(&buf);
                thread::spawn(move || (0..25).map(|_| buf.get()).collect::<Vec<u32>>())
            })
            .collect();
        for i in 0..100 {
            buf.put(i);
        }

        let mut all: Vec<u32> = consumers
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn full_buffer_blocks_producer() {
        let buf = Arc::new(BoundedBuffer::with_capacity(1));
        buf.put(1);
        let producer = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || buf.put(2))
        };
        thread::sleep(Duration::from_millis(20));
        assert!(!producer.is_finished());
        assert_eq!(buf.len(), 1);

        assert_eq!(buf.get(), 1);
        producer.join().unwrap();
        assert_eq!(buf.try_get(), Some(2));
    }

    #[test]
    fn timed_get_gives_up() {
        let buf: BoundedBuffer<u8> = BoundedBuffer::with_capacity(0);
        assert_eq!(buf.capacity(), Some(1));
        assert_eq!(buf.try_get(), None);
        assert_eq!(buf.get_timeout(Duration::from_millis(10)), None);
        buf.put(9);
        assert_eq!(buf.get_timeout(Duration::from_millis(10)), Some(9));
    }
}
