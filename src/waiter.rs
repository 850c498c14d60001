//! Blocked-thread accounting and the condvar waits that maintain it.
//!
//! Every suspension goes through [`wait`] or [`wait_until`], which register
//! the caller in a [`WaiterCount`] for exactly the duration of the wait. The
//! registration is a drop guard, so the count is restored on every exit path:
//! normal wakeup, timeout, or unwinding out of the wait.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, MutexGuard, PoisonError};
use std::time::Instant;

/// Number of threads currently suspended on one condition.
///
/// Only changed while the owning queue's lock is held; reads from outside the
/// lock are snapshots.
#[derive(Debug, Default)]
pub(crate) struct WaiterCount(AtomicUsize);

impl WaiterCount {
    pub(crate) const fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    pub(crate) fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    fn enter(&self) -> Waiting<'_> {
        self.0.fetch_add(1, Ordering::AcqRel);
        Waiting(&self.0)
    }
}

/// Registration of one blocked thread. Dropping it deregisters.
struct Waiting<'a>(&'a AtomicUsize);

impl Drop for Waiting<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Suspends on `condvar` until notified (or spuriously woken), counting the
/// caller in `waiters` meanwhile.
///
/// The lock is released atomically with suspension and held again when this
/// returns. The caller must re-check its condition.
pub(crate) fn wait<'a, S>(
    condvar: &Condvar,
    guard: MutexGuard<'a, S>,
    waiters: &WaiterCount,
) -> MutexGuard<'a, S> {
    let _waiting = waiters.enter();
    condvar.wait(guard).unwrap_or_else(PoisonError::into_inner)
}

/// Like [`wait`], but gives up once `deadline` has passed.
///
/// Returns with the lock held either way; the caller decides whether the
/// deadline expired by re-checking its condition and the clock.
pub(crate) fn wait_until<'a, S>(
    condvar: &Condvar,
    guard: MutexGuard<'a, S>,
    waiters: &WaiterCount,
    deadline: Instant,
) -> MutexGuard<'a, S> {
    let _waiting = waiters.enter();
    let timeout = deadline.saturating_duration_since(Instant::now());
    let (guard, _) = condvar
        .wait_timeout(guard, timeout)
        .unwrap_or_else(PoisonError::into_inner);
    guard
}
