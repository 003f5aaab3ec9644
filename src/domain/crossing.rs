//! Exit-spread crossing events.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::PairSymbol;

/// Which way the exit spread moved across the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingDirection {
    BecameProfitable,
    BecameUnprofitable,
}

/// One threshold crossing of a pair's net exit spread. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingEvent {
    pub pair_symbol: PairSymbol,
    #[serde(with = "rust_decimal::serde::float")]
    pub spread_net_percent_saida: Decimal,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub direction: Option<CrossingDirection>,
}

impl CrossingEvent {
    /// Create an event without direction information.
    pub fn new(
        pair_symbol: impl Into<PairSymbol>,
        spread_net_percent_saida: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            pair_symbol: pair_symbol.into(),
            spread_net_percent_saida,
            timestamp,
            direction: None,
        }
    }
}
