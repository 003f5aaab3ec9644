//! Connection supervisor: partitions pairs into shards and merges their output.
//!
//! # Architecture
//!
//! Each shard runs as a separate tokio task that reads from its own
//! connection and sends quotes into one shared bounded `mpsc` channel. A pair
//! belongs to exactly one shard per market and each shard forwards in arrival
//! order, so per-pair order is preserved end to end.
//!
//! One `watch` stop signal reaches every shard; it closes the socket and
//! suppresses any pending reconnect.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::shard::{ShardConnection, ShardTiming};
use super::state::{SharedCounters, ShardState};
use crate::domain::{Market, PairSymbol, Quote};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::feed::FeedConfig;
use crate::port::TransportFactory;

/// Aggregate connectivity of all shards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    /// Every shard is open.
    Online,
    /// Some, but not all, shards are open.
    Degraded,
    /// No shard is open.
    Offline,
}

/// Point-in-time supervisor statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    pub shards: usize,
    pub open_shards: usize,
    pub reconnects: u64,
    pub frames_decoded: u64,
    pub decode_errors: u64,
    pub quotes_forwarded: u64,
}

struct ShardHandle {
    id: String,
    state: Arc<Mutex<ShardState>>,
    task: JoinHandle<()>,
}

/// Owns every shard task for both markets.
pub struct ConnectionSupervisor {
    shards: Vec<ShardHandle>,
    counters: Arc<SharedCounters>,
    stop_tx: watch::Sender<bool>,
}

impl ConnectionSupervisor {
    /// Partition `pairs` into shards for both markets and spawn them.
    ///
    /// Returns the supervisor and the receiving end of the merged quote
    /// channel.
    ///
    /// # Errors
    ///
    /// Returns an error if `pairs_per_shard`, `max_shards_per_market` or
    /// `channel_capacity` is zero.
    pub fn start(
        pairs: &[PairSymbol],
        config: &FeedConfig,
        factory: TransportFactory,
    ) -> Result<(Self, mpsc::Receiver<Quote>)> {
        Self::validate_config(config)?;

        let (quote_tx, quote_rx) = mpsc::channel(config.channel_capacity);
        let (stop_tx, stop_rx) = watch::channel(false);
        let counters = Arc::new(SharedCounters::new());
        let timing = ShardTiming {
            heartbeat_interval: Duration::from_secs(config.heartbeat_interval_secs),
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
        };

        let chunks = distribute_pairs(pairs, config.pairs_per_shard, config.max_shards_per_market);
        info!(
            pairs = pairs.len(),
            shards_per_market = chunks.len(),
            per_shard = config.pairs_per_shard,
            channel_capacity = config.channel_capacity,
            "Starting connection supervisor"
        );

        let mut shards = Vec::with_capacity(chunks.len() * 2);
        for market in [Market::Spot, Market::Futures] {
            for (index, chunk) in chunks.iter().enumerate() {
                let id = format!("{market}-{index}");
                let shard = ShardConnection::new(
                    id.clone(),
                    market,
                    chunk.clone(),
                    factory.clone(),
                    timing,
                    quote_tx.clone(),
                    stop_rx.clone(),
                    counters.clone(),
                );
                info!(shard_id = %id, pairs = chunk.len(), "Spawning shard");
                let state = shard.state_handle();
                shards.push(ShardHandle {
                    id,
                    state,
                    task: tokio::spawn(shard.run()),
                });
            }
        }

        Ok((
            Self {
                shards,
                counters,
                stop_tx,
            },
            quote_rx,
        ))
    }

    fn validate_config(config: &FeedConfig) -> Result<()> {
        let invalid = |field: &'static str| -> crate::error::Error {
            ConfigError::InvalidValue {
                field,
                reason: "must be > 0".to_string(),
            }
            .into()
        };

        if config.pairs_per_shard == 0 {
            return Err(invalid("pairs_per_shard"));
        }
        if config.max_shards_per_market == 0 {
            return Err(invalid("max_shards_per_market"));
        }
        if config.channel_capacity == 0 {
            return Err(invalid("channel_capacity"));
        }
        Ok(())
    }

    /// Current state of every shard, spot shards first.
    #[must_use]
    pub fn shard_states(&self) -> Vec<(String, ShardState)> {
        self.shards
            .iter()
            .map(|s| (s.id.clone(), *s.state.lock()))
            .collect()
    }

    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        let open = self.open_shards();
        if open == 0 {
            Connectivity::Offline
        } else if open == self.shards.len() {
            Connectivity::Online
        } else {
            Connectivity::Degraded
        }
    }

    fn open_shards(&self) -> usize {
        self.shards.iter().filter(|s| s.state.lock().is_open()).count()
    }

    #[must_use]
    pub fn stats(&self) -> SupervisorStats {
        SupervisorStats {
            shards: self.shards.len(),
            open_shards: self.open_shards(),
            reconnects: SharedCounters::read(&self.counters.reconnects),
            frames_decoded: SharedCounters::read(&self.counters.frames_decoded),
            decode_errors: SharedCounters::read(&self.counters.decode_errors),
            quotes_forwarded: SharedCounters::read(&self.counters.quotes_forwarded),
        }
    }

    /// Signal every shard to close and wait for all of them to finish.
    pub async fn stop(&mut self) {
        let _ = self.stop_tx.send(true);
        for shard in self.shards.drain(..) {
            if let Err(e) = shard.task.await {
                warn!(shard_id = %shard.id, error = %e, "Shard task failed");
            }
        }
        info!("Connection supervisor stopped");
    }
}

impl Drop for ConnectionSupervisor {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
        for shard in &self.shards {
            shard.task.abort();
        }
    }
}

/// Split `pairs` into at most `max_shards` chunks of `per_shard`.
///
/// Pairs beyond `max_shards * per_shard` are appended to the last chunk.
#[must_use]
pub fn distribute_pairs(
    pairs: &[PairSymbol],
    per_shard: usize,
    max_shards: usize,
) -> Vec<Vec<PairSymbol>> {
    if per_shard == 0 || max_shards == 0 {
        return Vec::new();
    }
    let needed = pairs.len().div_ceil(per_shard).min(max_shards);

    let mut chunks: Vec<Vec<PairSymbol>> = pairs
        .chunks(per_shard)
        .take(needed)
        .map(<[PairSymbol]>::to_vec)
        .collect();

    // Overflow: remaining pairs go to last chunk
    let assigned: usize = chunks.iter().map(Vec::len).sum();
    if assigned < pairs.len() {
        if let Some(last) = chunks.last_mut() {
            last.extend_from_slice(&pairs[assigned..]);
        }
    }

    chunks
}
