//! In-memory table of per-pair opportunity state.
//!
//! The store is owned by the monitor task and mutated only there. Readers get
//! point-in-time copies through [`OpportunityStore::snapshot`] and
//! [`OpportunityStore::ranked`].

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::spread::{FeeSchedule, SpreadCalculator};
use crate::domain::{Market, OpportunityRecord, PairSymbol, Quote};
use crate::error::CalculationError;

/// Result of applying one quote.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// One leg is still unknown; no record exists for the pair yet.
    Pending,
    /// Both legs are known and the record was recomputed.
    Updated(OpportunityRecord),
    /// Both legs are known but the figures could not be derived.
    ///
    /// The previous record, if any, is left untouched.
    Rejected(CalculationError),
}

/// Selection rules for the records published on each sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishPolicy {
    /// Records not updated within this window are left out.
    pub stale_after: Duration,
    /// Records below this net spread are left out.
    pub min_net_spread_percent: Option<Decimal>,
}

impl Default for PublishPolicy {
    fn default() -> Self {
        Self {
            stale_after: Duration::seconds(60),
            min_net_spread_percent: None,
        }
    }
}

/// Latest quote per leg for one pair.
#[derive(Debug, Clone, Default)]
struct PairState {
    spot: Option<Quote>,
    futures: Option<Quote>,
    /// Last funding rate seen on any futures quote.
    funding_rate: Option<Decimal>,
}

impl PairState {
    fn legs(&self) -> Option<(&Quote, &Quote)> {
        Some((self.spot.as_ref()?, self.futures.as_ref()?))
    }
}

/// Owner of every [`OpportunityRecord`].
#[derive(Debug, Default)]
pub struct OpportunityStore {
    pairs: HashMap<PairSymbol, PairState>,
    records: HashMap<PairSymbol, OpportunityRecord>,
    /// Timestamp of the older leg behind each record.
    oldest_leg: HashMap<PairSymbol, DateTime<Utc>>,
}

impl OpportunityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a quote and, once both legs are present, recompute the pair.
    ///
    /// A recomputed record keeps its current `is_active` flag; activation is
    /// decided only by [`mark_batch_active`](Self::mark_batch_active).
    pub fn apply_quote(&mut self, quote: Quote, fees: &FeeSchedule) -> ApplyOutcome {
        let pair = quote.pair.clone();
        let state = self.pairs.entry(pair.clone()).or_default();

        match quote.market {
            Market::Spot => state.spot = Some(quote),
            Market::Futures => {
                if quote.funding_rate.is_some() {
                    state.funding_rate = quote.funding_rate;
                }
                state.futures = Some(quote);
            }
        }

        let Some((spot, futures)) = state.legs() else {
            trace!(pair = %pair, "Waiting for second leg");
            return ApplyOutcome::Pending;
        };

        let figures = match SpreadCalculator::calculate(spot, futures, fees, state.funding_rate) {
            Ok(figures) => figures,
            Err(err) => {
                debug!(pair = %pair, error = %err, "Spread not derivable, pair held pending");
                return ApplyOutcome::Rejected(err);
            }
        };

        let is_active = self.records.get(&pair).is_some_and(|r| r.is_active);
        let record = OpportunityRecord {
            pair_symbol: pair.clone(),
            spot_bid: spot.bid,
            spot_ask: spot.ask,
            futures_bid: futures.bid,
            futures_ask: futures.ask,
            spot_volume_24h: spot.volume_24h,
            futures_volume_24h: futures.volume_24h,
            spot_taker_fee: fees.spot_taker_percent,
            futures_taker_fee: fees.futures_taker_percent,
            funding_rate: state.funding_rate,
            spread_gross_percent: figures.gross_percent,
            spread_net_percent: figures.net_percent,
            spread_net_percent_entrada: figures.net_percent_entrada,
            spread_net_percent_saida: figures.net_percent_saida,
            is_active,
            timestamp: spot.timestamp.max(futures.timestamp),
        };

        self.oldest_leg
            .insert(pair.clone(), spot.timestamp.min(futures.timestamp));
        self.records.insert(pair, record.clone());
        ApplyOutcome::Updated(record)
    }

    /// Point-in-time copy of every known record, sorted by symbol.
    #[must_use]
    pub fn snapshot(&self) -> Vec<OpportunityRecord> {
        let mut records: Vec<_> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.pair_symbol.cmp(&b.pair_symbol));
        records
    }

    /// Records eligible for the next published batch.
    ///
    /// Freshness is judged on the older of the two legs, so a record whose
    /// other market went quiet ages out even while one leg keeps updating.
    #[must_use]
    pub fn publishable(&self, now: DateTime<Utc>, policy: &PublishPolicy) -> Vec<OpportunityRecord> {
        let cutoff = now - policy.stale_after;
        self.snapshot()
            .into_iter()
            .filter(|r| self.oldest_leg_at(r) >= cutoff)
            .filter(|r| {
                policy
                    .min_net_spread_percent
                    .map_or(true, |min| r.spread_net_percent >= min)
            })
            .collect()
    }

    fn oldest_leg_at(&self, record: &OpportunityRecord) -> DateTime<Utc> {
        self.oldest_leg
            .get(&record.pair_symbol)
            .copied()
            .unwrap_or(record.timestamp)
    }

    /// Full-refresh protocol: deactivate everything, then activate `batch`.
    ///
    /// Each batch record is inserted unless the store already holds a newer
    /// version of that pair, in which case only the flag is applied so a late
    /// batch never rolls prices back. Returns the batch as activated.
    pub fn mark_batch_active(&mut self, batch: Vec<OpportunityRecord>) -> Vec<OpportunityRecord> {
        for record in self.records.values_mut() {
            record.is_active = false;
        }

        let mut activated = Vec::with_capacity(batch.len());
        for mut incoming in batch {
            incoming.is_active = true;
            let record = match self.records.get_mut(&incoming.pair_symbol) {
                Some(current) if current.timestamp > incoming.timestamp => {
                    current.is_active = true;
                    current.clone()
                }
                _ => {
                    self.records
                        .insert(incoming.pair_symbol.clone(), incoming.clone());
                    incoming
                }
            };
            activated.push(record);
        }

        debug!(
            active = activated.len(),
            known = self.records.len(),
            "Batch marked active"
        );
        activated
    }

    /// Active records by `spread_net_percent`, best first.
    #[must_use]
    pub fn ranked(&self, limit: usize) -> Vec<OpportunityRecord> {
        let mut active: Vec<_> = self
            .records
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            b.spread_net_percent
                .cmp(&a.spread_net_percent)
                .then_with(|| a.pair_symbol.cmp(&b.pair_symbol))
        });
        active.truncate(limit);
        active
    }

    /// Pairs that have seen quotes but still lack a derivable record.
    #[must_use]
    pub fn pending_pairs(&self) -> BTreeSet<PairSymbol> {
        self.pairs
            .keys()
            .filter(|pair| !self.records.contains_key(*pair))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn get(&self, pair: &PairSymbol) -> Option<&OpportunityRecord> {
        self.records.get(pair)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.records.values().filter(|r| r.is_active).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
