//! Unbounded FIFO work queue with a join barrier on the count of unfinished tasks.

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Items go in with [`enqueue`](WorkQueue::enqueue), come out in FIFO order with
/// [`dequeue`](WorkQueue::dequeue), and are acknowledged with
/// [`task_done`](WorkQueue::task_done). [`join`](WorkQueue::join) blocks until every enqueued
/// item has been acknowledged.
pub struct WorkQueue<T> {
    /// None once closed.
    tx: Mutex<Option<Sender<T>>>,
    rx: Receiver<T>,
    unfinished: Mutex<usize>,
    all_done: Condvar,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

// The counter and sender slot stay consistent across a panic in another thread
// (no multi-step updates), so poisoned guards are taken as-is.
fn lock<U>(m: &Mutex<U>) -> MutexGuard<'_, U> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            tx: Mutex::new(Some(tx)),
            rx,
            unfinished: Mutex::new(0),
            all_done: Condvar::new(),
        }
    }

    /// Append `item` at the tail. Never blocks. Fails only after [`close`](WorkQueue::close).
    pub fn enqueue(&self, item: T) -> Result<()> {
        let tx = lock(&self.tx);
        let Some(tx) = tx.as_ref() else {
            anyhow::bail!("enqueue on a closed work queue");
        };
        // Count before sending so a fast worker can't acknowledge an uncounted item.
        *lock(&self.unfinished) += 1;
        if tx.send(item).is_err() {
            // Receiver lives in self, so this only happens if it was dropped mid-teardown.
            self.finish_one();
            anyhow::bail!("work queue receiver is gone");
        }
        Ok(())
    }

    /// Block until an item is available and return the head. `None` once the queue is closed
    /// and drained.
    pub fn dequeue(&self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// Acknowledge one dequeued item. Wakes [`join`](WorkQueue::join) when none remain.
    pub fn task_done(&self) -> Result<()> {
        let mut unfinished = lock(&self.unfinished);
        if *unfinished == 0 {
            anyhow::bail!("task_done() called more times than items were enqueued");
        }
        *unfinished -= 1;
        if *unfinished == 0 {
            self.all_done.notify_all();
        }
        Ok(())
    }

    fn finish_one(&self) {
        let mut unfinished = lock(&self.unfinished);
        *unfinished = unfinished.saturating_sub(1);
        if *unfinished == 0 {
            self.all_done.notify_all();
        }
    }

    /// Block until every enqueued item has been acknowledged.
    pub fn join(&self) {
        let mut unfinished = lock(&self.unfinished);
        while *unfinished > 0 {
            unfinished = self
                .all_done
                .wait(unfinished)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Stop accepting items. Workers drain what is left, then `dequeue` returns `None`.
    pub fn close(&self) {
        lock(&self.tx).take();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.tx).is_none()
    }

    /// Items enqueued but not yet acknowledged (pending + in progress).
    pub fn unfinished(&self) -> usize {
        *lock(&self.unfinished)
    }

    /// Items waiting to be dequeued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
