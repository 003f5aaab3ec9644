//! Bounded hand-off between the monitor and the sync task.
//!
//! Pushing never blocks. When the queue is full the oldest batch is dropped;
//! its crossing events are carried into the next batch since they cannot be
//! superseded by a later snapshot.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::warn;

use crate::domain::SyncBatch;

struct Inner {
    batches: Mutex<VecDeque<SyncBatch>>,
    notify: Notify,
    capacity: usize,
    closed: AtomicBool,
    dropped: AtomicU64,
}

/// Single-consumer batch queue with drop-oldest overflow.
#[derive(Clone)]
pub struct SyncQueue {
    inner: Arc<Inner>,
}

impl SyncQueue {
    /// A queue holding at most `capacity` batches (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                batches: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
                notify: Notify::new(),
                capacity: capacity.max(1),
                closed: AtomicBool::new(false),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Enqueue `batch`, dropping the oldest pending batch when full.
    pub fn push(&self, mut batch: SyncBatch) {
        {
            let mut batches = self.inner.batches.lock();
            if batches.len() >= self.inner.capacity {
                if let Some(oldest) = batches.pop_front() {
                    self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        batch_id = %oldest.id,
                        opportunities = oldest.opportunities.len(),
                        carried_crossings = oldest.crossings.len(),
                        "Sync queue full, dropping oldest batch"
                    );
                    let target = match batches.front_mut() {
                        Some(next) => &mut next.crossings,
                        None => &mut batch.crossings,
                    };
                    let later = std::mem::replace(target, oldest.crossings);
                    target.extend(later);
                }
            }
            batches.push_back(batch);
        }
        self.inner.notify.notify_one();
    }

    /// Wait for the next batch. Returns `None` once closed and empty.
    pub async fn pop(&self) -> Option<SyncBatch> {
        loop {
            let next = self.inner.batches.lock().pop_front();
            if let Some(batch) = next {
                return Some(batch);
            }
            if self.inner.closed.load(Ordering::Acquire) {
                return None;
            }
            self.inner.notify.notified().await;
        }
    }

    /// No more batches will be pushed.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.notify.notify_one();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.batches.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Batches dropped on overflow so far.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }
}
