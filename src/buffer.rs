use std::collections::VecDeque;

const PREALLOCATE_LIMIT: usize = 1024;

/// FIFO storage owned by a queue, always accessed under the queue's lock.
///
/// `capacity` is `None` for unbounded queues. A bounded buffer may briefly
/// hold more than `capacity` items after the capacity was lowered; nothing is
/// evicted, it just stops admitting until it drains below the new limit.
pub(crate) struct Buffer<T> {
    items: VecDeque<T>,
    capacity: Option<usize>,
}

impl<T> Buffer<T> {
    pub(crate) fn unbounded() -> Self {
        Self {
            items: VecDeque::new(),
            capacity: None,
        }
    }

    pub(crate) fn bounded(capacity: usize) -> Self {
        // The limit is logical; storage grows on demand.
        Self {
            items: VecDeque::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
            capacity: Some(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Replaces the capacity of a bounded buffer, returning the old one.
    /// An unbounded buffer stays unbounded.
    pub(crate) fn set_capacity(&mut self, capacity: usize) -> Option<usize> {
        match self.capacity.as_mut() {
            Some(current) => Some(std::mem::replace(current, capacity)),
            None => None,
        }
    }

    /// Whether one more item may be admitted.
    pub(crate) fn has_space(&self) -> bool {
        self.capacity.map_or(true, |capacity| self.items.len() < capacity)
    }

    /// Free slots under the current capacity; `None` when unbounded.
    pub(crate) fn free_slots(&self) -> Option<usize> {
        self.capacity
            .map(|capacity| capacity.saturating_sub(self.items.len()))
    }

    pub(crate) fn push_back(&mut self, item: T) {
        self.items.push_back(item);
    }

    pub(crate) fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }
}
