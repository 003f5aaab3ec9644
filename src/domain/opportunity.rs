//! The per-pair opportunity record published to the store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::PairSymbol;

/// Output of the spread calculator for one spot/futures quote pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpreadFigures {
    pub gross_percent: Decimal,
    pub net_percent: Decimal,
    pub net_percent_entrada: Decimal,
    pub net_percent_saida: Decimal,
}

/// Current state of one pair, as persisted by the external store.
///
/// Field names are the store's column names. Numbers go out as JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub pair_symbol: PairSymbol,
    #[serde(with = "rust_decimal::serde::float")]
    pub spot_bid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spot_ask: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub futures_bid: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub futures_ask: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spot_volume_24h: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub futures_volume_24h: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spot_taker_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub futures_taker_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float_option", default)]
    pub funding_rate: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub spread_gross_percent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spread_net_percent: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spread_net_percent_entrada: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spread_net_percent_saida: Decimal,
    pub is_active: bool,
    pub timestamp: DateTime<Utc>,
}

impl OpportunityRecord {
    /// Spread figures carried by this record.
    #[must_use]
    pub fn figures(&self) -> SpreadFigures {
        SpreadFigures {
            gross_percent: self.spread_gross_percent,
            net_percent: self.spread_net_percent,
            net_percent_entrada: self.spread_net_percent_entrada,
            net_percent_saida: self.spread_net_percent_saida,
        }
    }
}
