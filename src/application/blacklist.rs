//! Rolling-window crossing counts and derived blacklist membership.
//!
//! Nothing here is cached: every query walks the event log, so the answer
//! always matches the current events and the requested window.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};

use crate::domain::{BlacklistWindow, CrossingEvent, PairSymbol};

/// Crossings a pair may have inside the window before it is blacklisted.
pub const DEFAULT_MAX_CROSSINGS: usize = 3;

/// Derives blacklist membership from recorded crossing events.
#[derive(Debug)]
pub struct BlacklistEngine {
    max_crossings: usize,
    /// Crossing events, oldest first.
    events: VecDeque<CrossingEvent>,
}

impl BlacklistEngine {
    #[must_use]
    pub fn new(max_crossings: usize) -> Self {
        Self {
            max_crossings,
            events: VecDeque::new(),
        }
    }

    /// Append a crossing event to the log.
    ///
    /// Events normally arrive in time order; an out-of-order event is
    /// inserted at its place so pruning stays a prefix cut.
    pub fn record(&mut self, event: CrossingEvent) {
        let position = self
            .events
            .iter()
            .rposition(|e| e.timestamp <= event.timestamp)
            .map_or(0, |i| i + 1);
        self.events.insert(position, event);
    }

    /// Crossings per pair within `[now - window, now]`.
    #[must_use]
    pub fn counts(&self, window: BlacklistWindow, now: DateTime<Utc>) -> BTreeMap<PairSymbol, usize> {
        let start = now - window.duration();
        let mut counts = BTreeMap::new();
        for event in self
            .events
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= now)
        {
            *counts.entry(event.pair_symbol.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Pairs with strictly more than `max_crossings` crossings in the window.
    #[must_use]
    pub fn blacklist(&self, window: BlacklistWindow, now: DateTime<Utc>) -> BTreeSet<PairSymbol> {
        self.counts(window, now)
            .into_iter()
            .filter(|(_, count)| *count > self.max_crossings)
            .map(|(pair, _)| pair)
            .collect()
    }

    #[must_use]
    pub fn is_blacklisted(&self, pair: &PairSymbol, window: BlacklistWindow, now: DateTime<Utc>) -> bool {
        self.counts(window, now)
            .get(pair)
            .is_some_and(|count| *count > self.max_crossings)
    }

    /// Drop events older than `cutoff`. Returns how many were removed.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.events.len();
        while self.events.front().is_some_and(|e| e.timestamp < cutoff) {
            self.events.pop_front();
        }
        before - self.events.len()
    }

    /// Drop events no supported window can still count.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        self.prune_older_than(now - BlacklistWindow::longest().duration())
    }

    #[must_use]
    pub fn max_crossings(&self) -> usize {
        self.max_crossings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for BlacklistEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CROSSINGS)
    }
}

/// Operator-maintained blacklist, kept apart from the derived one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualBlacklist {
    pairs: BTreeSet<PairSymbol>,
}

impl ManualBlacklist {
    pub fn new(pairs: impl IntoIterator<Item = PairSymbol>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, pair: PairSymbol) -> bool {
        self.pairs.insert(pair)
    }

    pub fn remove(&mut self, pair: &PairSymbol) -> bool {
        self.pairs.remove(pair)
    }

    #[must_use]
    pub fn contains(&self, pair: &PairSymbol) -> bool {
        self.pairs.contains(pair)
    }

    #[must_use]
    pub fn pairs(&self) -> &BTreeSet<PairSymbol> {
        &self.pairs
    }
}

/// Union of derived and manual membership.
#[must_use]
pub fn combined(derived: &BTreeSet<PairSymbol>, manual: &ManualBlacklist) -> BTreeSet<PairSymbol> {
    derived.union(manual.pairs()).cloned().collect()
}
