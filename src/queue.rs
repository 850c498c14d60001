//! Unbounded blocking FIFO queue.

use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::buffer::Buffer;
use crate::error::QueueError;
use crate::waiter::{self, WaiterCount};

/// A FIFO queue shared between producer and consumer threads.
///
/// `push` never blocks. `pop` blocks while the queue is empty; `try_pop` and
/// `pop_timeout` are the non-blocking and time-limited variants.
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use syncqueue::Queue;
///
/// let queue = Arc::new(Queue::new());
/// let consumer = {
///     let queue = Arc::clone(&queue);
///     thread::spawn(move || queue.pop())
/// };
/// queue.push("hello");
/// assert_eq!(consumer.join().unwrap(), "hello");
/// ```
pub struct Queue<T> {
    buffer: Mutex<Buffer<T>>,
    item_available: Condvar,
    waiting_consumers: WaiterCount,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self::with_buffer(Buffer::unbounded())
    }

    pub(crate) fn with_buffer(buffer: Buffer<T>) -> Self {
        Self {
            buffer: Mutex::new(buffer),
            item_available: Condvar::new(),
            waiting_consumers: WaiterCount::new(),
        }
    }

    /// Acquires the queue lock.
    ///
    /// Every mutation completes before the lock is released, so the buffer is
    /// consistent even if a previous holder panicked.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Buffer<T>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item` and wakes one blocked consumer.
    pub fn push(&self, item: T) {
        let mut buffer = self.lock();
        self.push_locked(&mut buffer, item);
    }

    pub(crate) fn push_locked(&self, buffer: &mut Buffer<T>, item: T) {
        buffer.push_back(item);
        self.item_available.notify_one();
    }

    /// Removes the head item, blocking while the queue is empty.
    pub fn pop(&self) -> T {
        self.pop_then(|_| {})
    }

    /// Removes the head item, failing with [`QueueError::EmptyQueue`] instead
    /// of blocking.
    pub fn try_pop(&self) -> Result<T, QueueError> {
        self.try_pop_then(|_| {})
    }

    /// Removes the head item, waiting at most `timeout` for one to arrive.
    pub fn pop_timeout(&self, timeout: Duration) -> Result<T, QueueError> {
        self.pop_timeout_then(timeout, |_| {})
    }

    // The `_then` variants run `on_removed` under the lock right after an
    // item was taken; the bounded queue uses it to signal free space.

    pub(crate) fn pop_then<F>(&self, on_removed: F) -> T
    where
        F: FnOnce(&Buffer<T>),
    {
        let mut buffer = self.lock();
        loop {
            if let Some(item) = buffer.pop_front() {
                on_removed(&*buffer);
                return item;
            }
            trace!("consumer blocking on empty queue");
            buffer = waiter::wait(&self.item_available, buffer, &self.waiting_consumers);
        }
    }

    pub(crate) fn try_pop_then<F>(&self, on_removed: F) -> Result<T, QueueError>
    where
        F: FnOnce(&Buffer<T>),
    {
        let mut buffer = self.lock();
        let item = buffer.pop_front().ok_or(QueueError::EmptyQueue)?;
        on_removed(&*buffer);
        Ok(item)
    }

    pub(crate) fn pop_timeout_then<F>(
        &self,
        timeout: Duration,
        on_removed: F,
    ) -> Result<T, QueueError>
    where
        F: FnOnce(&Buffer<T>),
    {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return Ok(self.pop_then(on_removed));
        };

        let mut buffer = self.lock();
        loop {
            if let Some(item) = buffer.pop_front() {
                on_removed(&*buffer);
                return Ok(item);
            }
            if Instant::now() >= deadline {
                trace!(?timeout, "consumer gave up waiting");
                return Err(QueueError::TimedOut(timeout));
            }
            buffer = waiter::wait_until(
                &self.item_available,
                buffer,
                &self.waiting_consumers,
                deadline,
            );
        }
    }

    /// Number of queued items. A snapshot: other threads may change it
    /// immediately.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue is empty. A snapshot, not a guarantee.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every queued item. Blocked consumers stay blocked.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of threads blocked in `pop`.
    pub fn waiting_count(&self) -> usize {
        self.waiting_consumers.get()
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Contents are never dumped.
impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("len", &self.len())
            .field("waiting", &self.waiting_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn eventually(what: &str, check: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !check() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = Queue::new();
        for i in 1..=5 {
            queue.push(i);
        }
        let popped: Vec<i32> = (0..5).map(|_| queue.pop()).collect();
        assert_eq!(popped, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_try_pop_empty() {
        let queue: Queue<u8> = Queue::new();
        assert_eq!(queue.try_pop(), Err(QueueError::EmptyQueue));

        queue.push(9);
        assert_eq!(queue.try_pop(), Ok(9));
        assert_eq!(queue.try_pop(), Err(QueueError::EmptyQueue));
    }

    #[test]
    fn test_len_and_clear() {
        let queue = Queue::default();
        assert!(queue.is_empty());
        queue.push("a");
        queue.push("b");
        assert_eq!(queue.len(), 2);
        assert!(!queue.is_empty());

        queue.clear();
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.try_pop(), Err(QueueError::EmptyQueue));
    }

    #[test]
    fn test_blocking_handoff() {
        let queue = Arc::new(Queue::new());
        let (tx, rx) = channel::bounded(1);

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || tx.send(queue.pop()).unwrap())
        };

        eventually("consumer to block", || queue.waiting_count() == 1);
        queue.push(42);

        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok(42));
        consumer.join().unwrap();
        assert_eq!(queue.waiting_count(), 0);
    }

    #[test]
    fn test_waiter_accounting() {
        const CONSUMERS: usize = 4;
        let queue = Arc::new(Queue::new());
        let (tx, rx) = channel::unbounded();

        let handles: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let tx = tx.clone();
                thread::spawn(move || tx.send(queue.pop()).unwrap())
            })
            .collect();

        eventually("all consumers to block", || queue.waiting_count() == CONSUMERS);

        for i in 0..CONSUMERS {
            queue.push(i);
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.waiting_count(), 0);

        let received: Vec<usize> = rx.try_iter().collect();
        assert_eq!(received.len(), CONSUMERS);
        let distinct: HashSet<usize> = received.into_iter().collect();
        assert_eq!(distinct, (0..CONSUMERS).collect());
    }

    #[test]
    fn test_clear_keeps_consumers_blocked() {
        let queue = Arc::new(Queue::new());
        let (tx, rx) = channel::bounded(1);

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || tx.send(queue.pop()).unwrap())
        };
        eventually("consumer to block", || queue.waiting_count() == 1);

        queue.clear();
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        assert_eq!(queue.waiting_count(), 1);

        queue.push("late");
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)), Ok("late"));
        consumer.join().unwrap();
    }

    #[test]
    fn test_pop_timeout_expires() {
        let queue: Queue<u32> = Queue::new();
        let start = Instant::now();

        let result = queue.pop_timeout(Duration::from_millis(30));

        assert_eq!(result, Err(QueueError::TimedOut(Duration::from_millis(30))));
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert_eq!(queue.waiting_count(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_timeout_receives() {
        let queue = Arc::new(Queue::new());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                queue.push(5);
            })
        };

        assert_eq!(queue.pop_timeout(Duration::from_secs(5)), Ok(5));
        producer.join().unwrap();
    }

    #[test]
    fn test_pop_timeout_huge_duration_still_returns_queued() {
        let queue = Queue::new();
        queue.push(1);
        assert_eq!(queue.pop_timeout(Duration::MAX), Ok(1));
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let queue = Arc::new(Queue::new());
        queue.push(1);

        let poisoner = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let _buffer = queue.lock();
                panic!("panicked while holding the queue lock");
            })
        };
        assert!(poisoner.join().is_err());

        queue.push(2);
        assert_eq!(queue.pop(), 1);
        assert_eq!(queue.try_pop(), Ok(2));
    }

    #[test]
    fn test_debug_hides_items() {
        let queue = Queue::new();
        queue.push("secret");
        let shown = format!("{queue:?}");
        assert!(shown.contains("len: 1"));
        assert!(!shown.contains("secret"));
    }
}
