//! Sync task: submits queued batches to the external store.
//!
//! Each request is retried with a fixed delay up to `max_attempts`; after
//! that the rest of the batch is dropped. Ingestion never waits on this task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::adapter::outbound::store::parse_blacklist;
use crate::application::queue::SyncQueue;
use crate::domain::{PairSymbol, SyncBatch};
use crate::error::SyncError;
use crate::infrastructure::config::sync::SyncConfig;
use crate::port::{CrossingAction, OpportunityWriteMode, StoreAction, StoreGateway};

/// Running totals for the sync task.
#[derive(Debug, Default)]
pub struct SyncCounters {
    batches_sent: AtomicU64,
    batches_dropped: AtomicU64,
    failed_requests: AtomicU64,
}

/// Point-in-time copy of [`SyncCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub batches_sent: u64,
    pub batches_dropped: u64,
    pub failed_requests: u64,
}

impl SyncCounters {
    #[must_use]
    pub fn snapshot(&self) -> SyncStats {
        SyncStats {
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            batches_dropped: self.batches_dropped.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
        }
    }
}

/// Drains the [`SyncQueue`] into a [`StoreGateway`].
pub struct SyncClient {
    gateway: Arc<dyn StoreGateway>,
    queue: SyncQueue,
    mode: OpportunityWriteMode,
    crossing_action: CrossingAction,
    retry_delay: Duration,
    max_attempts: u32,
    counters: Arc<SyncCounters>,
}

impl SyncClient {
    #[must_use]
    pub fn new(gateway: Arc<dyn StoreGateway>, queue: SyncQueue, config: &SyncConfig) -> Self {
        Self {
            gateway,
            queue,
            mode: config.mode,
            crossing_action: config.crossing_action,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            max_attempts: config.max_attempts.max(1),
            counters: Arc::new(SyncCounters::default()),
        }
    }

    /// Shared counters, readable while the task runs.
    #[must_use]
    pub fn counters(&self) -> Arc<SyncCounters> {
        self.counters.clone()
    }

    /// Submit batches until the queue is closed and empty.
    ///
    /// Once `stop` is set, remaining batches get a single attempt each.
    pub async fn run(self, stop: watch::Receiver<bool>) {
        info!(gateway = self.gateway.name(), "Sync task starting");
        while let Some(batch) = self.queue.pop().await {
            self.submit(batch, &stop).await;
        }
        let stats = self.counters.snapshot();
        info!(
            batches_sent = stats.batches_sent,
            batches_dropped = stats.batches_dropped,
            "Sync task stopped"
        );
    }

    /// Submit one batch: opportunities first, then each crossing in order.
    ///
    /// Returns `true` when every request was accepted.
    pub async fn submit(&self, batch: SyncBatch, stop: &watch::Receiver<bool>) -> bool {
        let batch_id = batch.id;
        let skip_opportunities =
            self.mode == OpportunityWriteMode::Upsert && batch.opportunities.is_empty();

        let mut actions = Vec::with_capacity(batch.crossings.len() + 1);
        if !skip_opportunities {
            actions.push(StoreAction::opportunities(self.mode, batch.opportunities));
        }
        actions.extend(
            batch
                .crossings
                .into_iter()
                .map(|event| StoreAction::crossing(self.crossing_action, event)),
        );

        let total = actions.len();
        for (index, action) in actions.iter().enumerate() {
            if let Err(e) = self.send_with_retry(action, stop).await {
                self.counters.batches_dropped.fetch_add(1, Ordering::Relaxed);
                error!(
                    batch_id = %batch_id,
                    action = action.name(),
                    skipped = total - index - 1,
                    error = %e,
                    "Dropping sync batch"
                );
                return false;
            }
        }

        self.counters.batches_sent.fetch_add(1, Ordering::Relaxed);
        debug!(batch_id = %batch_id, requests = total, "Sync batch submitted");
        true
    }

    async fn send_with_retry(
        &self,
        action: &StoreAction,
        stop: &watch::Receiver<bool>,
    ) -> Result<(), SyncError> {
        let mut attempt = 1;
        loop {
            match self.gateway.call(action).await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    self.counters.failed_requests.fetch_add(1, Ordering::Relaxed);
                    let stopping = *stop.borrow();
                    if attempt >= self.max_attempts || stopping {
                        return Err(e);
                    }
                    warn!(
                        action = action.name(),
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Store request failed, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Fetch the store's blacklist.
///
/// # Errors
///
/// Returns the gateway error or a [`SyncError::Response`] for an unexpected
/// payload.
pub async fn fetch_blacklist(gateway: &dyn StoreGateway) -> Result<Vec<PairSymbol>, SyncError> {
    let body = gateway.call(&StoreAction::GetBlacklist).await?;
    parse_blacklist(body)
}

/// Call the store's `health_check` action.
///
/// # Errors
///
/// Returns the gateway error.
pub async fn check_store(gateway: &dyn StoreGateway) -> Result<(), SyncError> {
    gateway.call(&StoreAction::HealthCheck).await.map(|_| ())
}
