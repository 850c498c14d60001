use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors reported by queue operations.
///
/// None of these are fatal: the queue stays fully usable after any of them.
#[non_exhaustive]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue empty")]
    EmptyQueue,

    #[error("queue full")]
    QueueFull,

    #[error("queue size must be positive, got {0}")]
    InvalidCapacity(i64),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// A push that could not complete. Owns the rejected item so the caller can
/// retry or route it elsewhere.
#[derive(PartialEq, Eq)]
pub struct PushError<T> {
    item: T,
    kind: QueueError,
}

impl<T> PushError<T> {
    pub(crate) fn new(item: T, kind: QueueError) -> Self {
        Self { item, kind }
    }

    pub fn kind(&self) -> QueueError {
        self.kind
    }

    /// Returns the item that failed to be enqueued.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.item
    }
}

// Items may be large or not Debug; only the kind is shown.
impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushError").field("kind", &self.kind).finish_non_exhaustive()
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "push rejected: {}", self.kind)
    }
}

impl<T> std::error::Error for PushError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl<T> From<PushError<T>> for QueueError {
    fn from(err: PushError<T>) -> Self {
        err.kind
    }
}
