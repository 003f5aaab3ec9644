//! The monitor task: sole owner and writer of all opportunity state.
//!
//! Quotes arrive on one merged channel and are applied in order. On every
//! sync tick the monitor activates the publishable records, drains new
//! crossings and hands both to the sync queue as one batch. Reads arrive as
//! commands and are answered with point-in-time copies.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use super::blacklist::{combined, BlacklistEngine, ManualBlacklist};
use super::crossing::CrossingDetector;
use super::queue::SyncQueue;
use super::spread::FeeTable;
use super::store::{ApplyOutcome, OpportunityStore, PublishPolicy};
use crate::domain::{BlacklistWindow, OpportunityRecord, PairSymbol, Quote, SyncBatch};
use crate::error::{Error, Result};

const COMMAND_BUFFER: usize = 64;

/// Everything the monitor needs besides its channels.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub fees: FeeTable,
    pub publish: PublishPolicy,
    pub crossing_threshold: Decimal,
    pub max_crossings: usize,
    pub manual_blacklist: ManualBlacklist,
    pub sync_interval: Duration,
    pub prune_interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            fees: FeeTable::default(),
            publish: PublishPolicy::default(),
            crossing_threshold: Decimal::ZERO,
            max_crossings: super::blacklist::DEFAULT_MAX_CROSSINGS,
            manual_blacklist: ManualBlacklist::default(),
            sync_interval: Duration::from_secs(5),
            prune_interval: Duration::from_secs(60),
        }
    }
}

/// Point-in-time monitor counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub quotes_applied: u64,
    pub rejected: u64,
    pub records: usize,
    pub active: usize,
    pub pending_pairs: usize,
    pub crossings_in_log: usize,
    pub batches_published: u64,
}

/// Read-model queries and operator commands.
#[derive(Debug)]
pub enum MonitorCommand {
    Top {
        limit: usize,
        reply: oneshot::Sender<Vec<OpportunityRecord>>,
    },
    CrossingCounts {
        window: BlacklistWindow,
        reply: oneshot::Sender<BTreeMap<PairSymbol, usize>>,
    },
    Blacklist {
        window: BlacklistWindow,
        reply: oneshot::Sender<BTreeSet<PairSymbol>>,
    },
    Pending {
        reply: oneshot::Sender<BTreeSet<PairSymbol>>,
    },
    SetManual {
        pair: PairSymbol,
        blacklisted: bool,
        reply: oneshot::Sender<bool>,
    },
    Stats {
        reply: oneshot::Sender<MonitorStats>,
    },
}

/// Cloneable façade for querying a running [`Monitor`].
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<MonitorCommand>,
}

impl MonitorHandle {
    async fn ask<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> MonitorCommand) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| Error::MonitorStopped)?;
        rx.await.map_err(|_| Error::MonitorStopped)
    }

    /// Active records by `spread_net_percent`, best first.
    pub async fn top(&self, limit: usize) -> Result<Vec<OpportunityRecord>> {
        self.ask(|reply| MonitorCommand::Top { limit, reply }).await
    }

    /// Crossings per pair inside `window`.
    pub async fn crossing_counts(&self, window: BlacklistWindow) -> Result<BTreeMap<PairSymbol, usize>> {
        self.ask(|reply| MonitorCommand::CrossingCounts { window, reply })
            .await
    }

    /// Derived blacklist for `window` joined with the manual one.
    pub async fn blacklist(&self, window: BlacklistWindow) -> Result<BTreeSet<PairSymbol>> {
        self.ask(|reply| MonitorCommand::Blacklist { window, reply })
            .await
    }

    /// Pairs still missing a leg.
    pub async fn pending(&self) -> Result<BTreeSet<PairSymbol>> {
        self.ask(|reply| MonitorCommand::Pending { reply }).await
    }

    /// Add or remove a pair on the manual blacklist. Returns whether the
    /// set changed.
    pub async fn set_manual(&self, pair: PairSymbol, blacklisted: bool) -> Result<bool> {
        self.ask(|reply| MonitorCommand::SetManual {
            pair,
            blacklisted,
            reply,
        })
        .await
    }

    pub async fn stats(&self) -> Result<MonitorStats> {
        self.ask(|reply| MonitorCommand::Stats { reply }).await
    }
}

/// Aggregation point owning the store, detector and blacklist.
pub struct Monitor {
    store: OpportunityStore,
    detector: CrossingDetector,
    blacklist: BlacklistEngine,
    manual: ManualBlacklist,
    fees: FeeTable,
    publish: PublishPolicy,
    sync_interval: Duration,
    prune_interval: Duration,
    quotes: mpsc::Receiver<Quote>,
    commands: mpsc::Receiver<MonitorCommand>,
    queue: SyncQueue,
    quotes_applied: u64,
    rejected: u64,
    batches_published: u64,
}

impl Monitor {
    /// Build a monitor reading `quotes` and publishing into `queue`.
    #[must_use]
    pub fn new(
        settings: MonitorSettings,
        quotes: mpsc::Receiver<Quote>,
        queue: SyncQueue,
    ) -> (Self, MonitorHandle) {
        let (tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let monitor = Self {
            store: OpportunityStore::new(),
            detector: CrossingDetector::new(settings.crossing_threshold),
            blacklist: BlacklistEngine::new(settings.max_crossings),
            manual: settings.manual_blacklist,
            fees: settings.fees,
            publish: settings.publish,
            sync_interval: settings.sync_interval,
            prune_interval: settings.prune_interval,
            quotes,
            commands,
            queue,
            quotes_applied: 0,
            rejected: 0,
            batches_published: 0,
        };
        (monitor, MonitorHandle { tx })
    }

    /// Run until `stop` is set or the quote channel closes, then publish a
    /// final batch and close the sync queue.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        info!(
            sync_interval_ms = self.sync_interval.as_millis() as u64,
            "Monitor starting"
        );

        let mut sync_tick = interval_at(Instant::now() + self.sync_interval, self.sync_interval);
        sync_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut prune_tick = interval_at(Instant::now() + self.prune_interval, self.prune_interval);
        prune_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = stop.changed() => {
                    if result.is_err() || *stop.borrow() {
                        info!("Monitor stop requested");
                        break;
                    }
                }
                quote = self.quotes.recv() => {
                    let Some(quote) = quote else {
                        if *stop.borrow() {
                            info!("Quote channel closed during shutdown");
                        } else {
                            warn!("Quote channel closed");
                        }
                        break;
                    };
                    self.apply(quote);
                }
                _ = sync_tick.tick() => self.publish(),
                _ = prune_tick.tick() => {
                    let pruned = self.blacklist.prune(Utc::now());
                    if pruned > 0 {
                        debug!(pruned, remaining = self.blacklist.len(), "Pruned crossing log");
                    }
                }
                Some(command) = self.commands.recv() => self.handle(command),
            }
        }

        self.publish();
        self.queue.close();
        info!(
            quotes_applied = self.quotes_applied,
            batches = self.batches_published,
            "Monitor stopped"
        );
    }

    fn apply(&mut self, quote: Quote) {
        self.quotes_applied += 1;
        let fees = self.fees.schedule_for(&quote.pair);
        match self.store.apply_quote(quote, &fees) {
            ApplyOutcome::Pending => {}
            ApplyOutcome::Rejected(e) => {
                self.rejected += 1;
                debug!(error = %e, "Quote left pair pending");
            }
            ApplyOutcome::Updated(record) => {
                trace!(
                    pair = %record.pair_symbol,
                    net = %record.spread_net_percent,
                    saida = %record.spread_net_percent_saida,
                    "Record updated"
                );
                if let Some(event) = self.detector.observe(
                    &record.pair_symbol,
                    record.spread_net_percent_saida,
                    record.timestamp,
                ) {
                    self.blacklist.record(event);
                }
            }
        }
    }

    /// Activate publishable records and queue them with new crossings.
    fn publish(&mut self) {
        let now = Utc::now();
        let crossings = self.detector.drain();
        if self.store.is_empty() && crossings.is_empty() {
            return;
        }

        let candidates = self.store.publishable(now, &self.publish);
        let activated = self.store.mark_batch_active(candidates);
        let batch = SyncBatch::new(activated, crossings);
        debug!(
            batch_id = %batch.id,
            opportunities = batch.opportunities.len(),
            crossings = batch.crossings.len(),
            "Publishing sync batch"
        );
        self.queue.push(batch);
        self.batches_published += 1;
    }

    fn handle(&mut self, command: MonitorCommand) {
        let now = Utc::now();
        // A dropped reply receiver only means the caller gave up.
        match command {
            MonitorCommand::Top { limit, reply } => {
                let _ = reply.send(self.store.ranked(limit));
            }
            MonitorCommand::CrossingCounts { window, reply } => {
                let _ = reply.send(self.blacklist.counts(window, now));
            }
            MonitorCommand::Blacklist { window, reply } => {
                let derived = self.blacklist.blacklist(window, now);
                let _ = reply.send(combined(&derived, &self.manual));
            }
            MonitorCommand::Pending { reply } => {
                let _ = reply.send(self.store.pending_pairs());
            }
            MonitorCommand::SetManual {
                pair,
                blacklisted,
                reply,
            } => {
                let changed = if blacklisted {
                    self.manual.insert(pair)
                } else {
                    self.manual.remove(&pair)
                };
                let _ = reply.send(changed);
            }
            MonitorCommand::Stats { reply } => {
                let _ = reply.send(MonitorStats {
                    quotes_applied: self.quotes_applied,
                    rejected: self.rejected,
                    records: self.store.len(),
                    active: self.store.active_count(),
                    pending_pairs: self.store.pending_pairs().len(),
                    crossings_in_log: self.blacklist.len(),
                    batches_published: self.batches_published,
                });
            }
        }
    }
}
