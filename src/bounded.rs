//! Capacity-limited blocking FIFO queue.
//!
//! [`BoundedQueue`] wraps a [`Queue`] and shares its lock. Producers block
//! while the queue holds `capacity` or more items; a second condition
//! ("space available") wakes them as items are removed or the capacity
//! grows. The capacity can be changed at any time. Lowering it never evicts
//! queued items, it only holds back producers until the queue drains below
//! the new limit.

use std::fmt;
use std::sync::Condvar;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::buffer::Buffer;
use crate::error::{PushError, QueueError};
use crate::queue::Queue;
use crate::waiter::{self, WaiterCount};

/// Checks a requested capacity and converts it to a slot count.
pub(crate) fn validate_capacity(capacity: i64) -> Result<usize, QueueError> {
    if capacity <= 0 {
        return Err(QueueError::InvalidCapacity(capacity));
    }
    usize::try_from(capacity).map_err(|_| QueueError::InvalidCapacity(capacity))
}

pub struct BoundedQueue<T> {
    queue: Queue<T>,
    space_available: Condvar,
    waiting_producers: WaiterCount,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue admitting at most `capacity` items.
    ///
    /// Fails with [`QueueError::InvalidCapacity`] unless `capacity > 0`.
    pub fn new(capacity: i64) -> Result<Self, QueueError> {
        let capacity = validate_capacity(capacity)?;
        Ok(Self {
            queue: Queue::with_buffer(Buffer::bounded(capacity)),
            space_available: Condvar::new(),
            waiting_producers: WaiterCount::new(),
        })
    }

    /// Appends `item`, blocking while the queue is full.
    pub fn push(&self, item: T) {
        let mut buffer = self.queue.lock();
        while !buffer.has_space() {
            trace!("producer blocking on full queue");
            buffer = waiter::wait(&self.space_available, buffer, &self.waiting_producers);
        }
        self.queue.push_locked(&mut buffer, item);
    }

    /// Appends `item` if there is room, otherwise hands it back with
    /// [`QueueError::QueueFull`].
    pub fn try_push(&self, item: T) -> Result<(), PushError<T>> {
        let mut buffer = self.queue.lock();
        if !buffer.has_space() {
            return Err(PushError::new(item, QueueError::QueueFull));
        }
        self.queue.push_locked(&mut buffer, item);
        Ok(())
    }

    /// Appends `item`, waiting at most `timeout` for room.
    pub fn push_timeout(&self, item: T, timeout: Duration) -> Result<(), PushError<T>> {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.push(item);
            return Ok(());
        };

        let mut buffer = self.queue.lock();
        while !buffer.has_space() {
            if Instant::now() >= deadline {
                trace!(?timeout, "producer gave up waiting");
                return Err(PushError::new(item, QueueError::TimedOut(timeout)));
            }
            buffer = waiter::wait_until(
                &self.space_available,
                buffer,
                &self.waiting_producers,
                deadline,
            );
        }
        self.queue.push_locked(&mut buffer, item);
        Ok(())
    }

    /// Removes the head item, blocking while the queue is empty.
    pub fn pop(&self) -> T {
        self.queue.pop_then(|buffer| self.signal_space(buffer))
    }

    pub fn try_pop(&self) -> Result<T, QueueError> {
        self.queue.try_pop_then(|buffer| self.signal_space(buffer))
    }

    pub fn pop_timeout(&self, timeout: Duration) -> Result<T, QueueError> {
        self.queue
            .pop_timeout_then(timeout, |buffer| self.signal_space(buffer))
    }

    // One item left, so at most one producer can proceed.
    fn signal_space(&self, buffer: &Buffer<T>) {
        if buffer.has_space() {
            self.space_available.notify_one();
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drops every queued item and wakes as many blocked producers as there
    /// are newly freed slots.
    pub fn clear(&self) {
        let mut buffer = self.queue.lock();
        let before = buffer.free_slots().unwrap_or(0);
        buffer.clear();
        let freed = buffer.free_slots().unwrap_or(0) - before;
        self.notify_producers(freed);
    }

    /// Current admission limit.
    pub fn capacity(&self) -> usize {
        // A bounded buffer always carries a capacity.
        self.queue.lock().capacity().unwrap_or(usize::MAX)
    }

    /// Changes the admission limit, returning the new capacity.
    ///
    /// Growing by `k` wakes up to `k` blocked producers, one signal each;
    /// shrinking wakes nobody and evicts nothing.
    pub fn set_capacity(&self, capacity: i64) -> Result<usize, QueueError> {
        let capacity = validate_capacity(capacity)?;

        let mut buffer = self.queue.lock();
        let previous = buffer.set_capacity(capacity).unwrap_or(capacity);
        if capacity > previous {
            self.notify_producers(capacity - previous);
        }
        debug!(previous, capacity, len = buffer.len(), "queue capacity changed");
        Ok(capacity)
    }

    /// Issues `slots` single wakeups, never more than there are blocked
    /// producers. Called with the lock held, so the waiter count is current.
    fn notify_producers(&self, slots: usize) {
        let wakeups = slots.min(self.waiting_producers.get());
        for _ in 0..wakeups {
            self.space_available.notify_one();
        }
    }

    /// Threads blocked in either direction: consumers in `pop` plus
    /// producers in `push`.
    pub fn waiting_count(&self) -> usize {
        self.queue.waiting_count() + self.waiting_producers.get()
    }

    /// Threads blocked in `push` on a full queue.
    pub fn waiting_producers(&self) -> usize {
        self.waiting_producers.get()
    }

    /// Threads blocked in `pop` on an empty queue.
    pub fn waiting_consumers(&self) -> usize {
        self.queue.waiting_count()
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedQueue")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("waiting", &self.waiting_count())
            .finish_non_exhaustive()
    }
}
