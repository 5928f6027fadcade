//! Pending queue - FIFO of fragments awaiting batching
//!
//! Producers append from any context without blocking; the block accumulator
//! is the single consumer. A `Notify` wakes the consumer, and every wait is
//! bounded so a missed wakeup only costs one timeout.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::Fragment;
use tokio::sync::Notify;

/// Thread-safe unbounded fragment queue
#[derive(Debug, Default)]
pub struct PendingQueue {
    fragments: Mutex<VecDeque<Fragment>>,
    notify: Notify,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Fragment>> {
        self.fragments.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append all fragments in order and wake the consumer
    ///
    /// Returns the queue length after the append.
    pub fn enqueue<I>(&self, fragments: I) -> usize
    where
        I: IntoIterator<Item = Fragment>,
    {
        let len = {
            let mut queue = self.lock();
            queue.extend(fragments);
            queue.len()
        };
        self.notify.notify_one();
        len
    }

    /// Clone of the head fragment, if any
    pub fn try_peek_front(&self) -> Option<Fragment> {
        self.lock().front().cloned()
    }

    /// Remove the head fragment
    pub fn pop_front(&self) -> Option<Fragment> {
        self.lock().pop_front()
    }

    /// Peek and conditionally pop inside one critical section
    ///
    /// `f` sees the head fragment and returns its result plus whether the
    /// fragment was consumed. Returns `None` when the queue is empty.
    pub fn with_front<R>(&self, f: impl FnOnce(&Fragment) -> (R, bool)) -> Option<R> {
        let mut queue = self.lock();
        let (result, consumed) = f(queue.front()?);
        if consumed {
            queue.pop_front();
        }
        Some(result)
    }

    /// Wait until an enqueue happens or `timeout` elapses
    ///
    /// Returns whether the queue is non-empty afterwards.
    pub async fn wait_non_empty(&self, timeout: Duration) -> bool {
        if !self.is_empty() {
            return true;
        }
        // notify_one stores a permit, so an enqueue racing this call is not lost
        let _ = tokio::time::timeout(timeout, self.notify.notified()).await;
        !self.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop everything still pending, returning how many fragments were discarded
    pub fn clear(&self) -> usize {
        let mut queue = self.lock();
        let discarded = queue.len();
        queue.clear();
        discarded
    }
}
