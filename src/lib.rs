//! Blocking FIFO queues for handing work between threads.
//!
//! - [`Queue`]: unbounded; `push` never blocks, `pop` waits for an item.
//! - [`BoundedQueue`]: adds a capacity that can be resized at runtime;
//!   `push` waits for space.
//!
//! Each queue is guarded by a single mutex with condition variables for the
//! "item available" and "space available" events. Items come out in the
//! order they went in; which of several blocked threads is woken first is
//! unspecified. Every blocked thread is counted (see `waiting_count`), and the
//! count is kept correct even when a wait is abandoned by a timeout.
//!
//! ```
//! use syncqueue::{BoundedQueue, QueueError};
//!
//! let queue = BoundedQueue::new(1)?;
//! queue.push("a");
//! assert_eq!(queue.try_push("b").unwrap_err().kind(), QueueError::QueueFull);
//! assert_eq!(queue.pop(), "a");
//! assert_eq!(queue.try_pop(), Err(QueueError::EmptyQueue));
//! # Ok::<(), QueueError>(())
//! ```

mod bounded;
mod buffer;
pub mod config;
mod error;
mod message_queue;
mod queue;
mod waiter;

pub use bounded::BoundedQueue;
pub use error::{PushError, QueueError};
pub use message_queue::MessageQueue;
pub use queue::Queue;
