//! Exit-spread crossing detection.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::{CrossingDirection, CrossingEvent, PairSymbol};

/// Side of the threshold a value sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Above,
    AtOrBelow,
}

/// Emits a [`CrossingEvent`] whenever a pair's net exit spread moves to the
/// other side of the threshold.
///
/// The first observation for a pair only establishes its side.
#[derive(Debug)]
pub struct CrossingDetector {
    threshold: Decimal,
    last_side: HashMap<PairSymbol, Side>,
    /// Events not yet handed to the sync cycle.
    pending: Vec<CrossingEvent>,
}

impl CrossingDetector {
    #[must_use]
    pub fn new(threshold: Decimal) -> Self {
        Self {
            threshold,
            last_side: HashMap::new(),
            pending: Vec::new(),
        }
    }

    fn side(&self, value: Decimal) -> Side {
        if value > self.threshold {
            Side::Above
        } else {
            Side::AtOrBelow
        }
    }

    /// Feed the latest exit spread for `pair`.
    ///
    /// Returns the crossing event when the side changed; the event is also
    /// kept for [`drain`](Self::drain).
    pub fn observe(
        &mut self,
        pair: &PairSymbol,
        spread_net_percent_saida: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Option<CrossingEvent> {
        let side = self.side(spread_net_percent_saida);
        let previous = self.last_side.insert(pair.clone(), side)?;
        if previous == side {
            return None;
        }

        let direction = match side {
            Side::Above => CrossingDirection::BecameProfitable,
            Side::AtOrBelow => CrossingDirection::BecameUnprofitable,
        };
        info!(
            pair = %pair,
            saida = %spread_net_percent_saida,
            ?direction,
            "Exit spread crossed threshold"
        );

        let event = CrossingEvent {
            pair_symbol: pair.clone(),
            spread_net_percent_saida,
            timestamp,
            direction: Some(direction),
        };
        self.pending.push(event.clone());
        Some(event)
    }

    /// Take every event emitted since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<CrossingEvent> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn threshold(&self) -> Decimal {
        self.threshold
    }
}

impl Default for CrossingDetector {
    fn default() -> Self {
        Self::new(Decimal::ZERO)
    }
}
