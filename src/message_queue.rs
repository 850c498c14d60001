use std::time::Duration;

use crate::bounded::BoundedQueue;
use crate::error::QueueError;
use crate::queue::Queue;

/// Operations common to both queue flavours.
///
/// Lets producer/consumer code stay generic over whether the queue is
/// bounded, or hold either one as `Arc<dyn MessageQueue<T>>`. On a
/// [`BoundedQueue`], `push` blocks while the queue is full.
pub trait MessageQueue<T>: Send + Sync {
    fn push(&self, item: T);

    fn pop(&self) -> T;

    fn try_pop(&self) -> Result<T, QueueError>;

    fn pop_timeout(&self, timeout: Duration) -> Result<T, QueueError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);

    fn waiting_count(&self) -> usize;

    /// Admission limit, or `None` for an unbounded queue.
    fn capacity(&self) -> Option<usize>;
}

impl<T: Send> MessageQueue<T> for Queue<T> {
    fn push(&self, item: T) {
        Queue::push(self, item);
    }

    fn pop(&self) -> T {
        Queue::pop(self)
    }

    fn try_pop(&self) -> Result<T, QueueError> {
        Queue::try_pop(self)
    }

    fn pop_timeout(&self, timeout: Duration) -> Result<T, QueueError> {
        Queue::pop_timeout(self, timeout)
    }

    fn len(&self) -> usize {
        Queue::len(self)
    }

    fn is_empty(&self) -> bool {
        Queue::is_empty(self)
    }

    fn clear(&self) {
        Queue::clear(self);
    }

    fn waiting_count(&self) -> usize {
        Queue::waiting_count(self)
    }

    fn capacity(&self) -> Option<usize> {
        None
    }
}

impl<T: Send> MessageQueue<T> for BoundedQueue<T> {
    fn push(&self, item: T) {
        BoundedQueue::push(self, item);
    }

    fn pop(&self) -> T {
        BoundedQueue::pop(self)
    }

    fn try_pop(&self) -> Result<T, QueueError> {
        BoundedQueue::try_pop(self)
    }

    fn pop_timeout(&self, timeout: Duration) -> Result<T, QueueError> {
        BoundedQueue::pop_timeout(self, timeout)
    }

    fn len(&self) -> usize {
        BoundedQueue::len(self)
    }

    fn is_empty(&self) -> bool {
        BoundedQueue::is_empty(self)
    }

    fn clear(&self) {
        BoundedQueue::clear(self);
    }

    fn waiting_count(&self) -> usize {
        BoundedQueue::waiting_count(self)
    }

    fn capacity(&self) -> Option<usize> {
        Some(BoundedQueue::capacity(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn relay<Q: MessageQueue<u32> + ?Sized>(queue: &Q, items: &[u32]) -> Vec<u32> {
        thread::scope(|s| {
            s.spawn(|| {
                for &item in items {
                    queue.push(item);
                }
            });
            (0..items.len()).map(|_| queue.pop()).collect()
        })
    }

    #[test]
    fn test_generic_over_both_queues() {
        let items = [3, 1, 4, 1, 5, 9, 2, 6];

        assert_eq!(relay(&Queue::new(), &items), items);
        assert_eq!(relay(&BoundedQueue::new(2).unwrap(), &items), items);
    }

    #[test]
    fn test_trait_objects() {
        let queues: Vec<Arc<dyn MessageQueue<u32>>> = vec![
            Arc::new(Queue::new()),
            Arc::new(BoundedQueue::new(4).unwrap()),
        ];

        for queue in &queues {
            assert!(queue.is_empty());
            assert_eq!(queue.try_pop(), Err(QueueError::EmptyQueue));
            queue.push(8);
            assert_eq!(queue.len(), 1);
            queue.clear();
            assert_eq!(queue.waiting_count(), 0);
            assert_eq!(relay(queue.as_ref(), &[1, 2, 3]), vec![1, 2, 3]);
        }

        assert_eq!(queues[0].capacity(), None);
        assert_eq!(queues[1].capacity(), Some(4));
    }
}
