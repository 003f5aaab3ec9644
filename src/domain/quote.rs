//! Best bid/ask quotes produced by the feed decoder.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::PairSymbol;

/// Market type a quote was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// Spot order book.
    Spot,
    /// Perpetual futures order book.
    Futures,
}

impl Market {
    /// Channel prefix used on the wire (`spot.BTCUSDT.bbo`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spot => "spot",
            Self::Futures => "futures",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spot" => Ok(Self::Spot),
            "futures" | "swap" | "perp" => Ok(Self::Futures),
            other => Err(format!("unknown market '{other}'")),
        }
    }
}

/// Top-of-book update for one pair on one market.
///
/// Immutable once decoded; shard tasks hand these to the monitor by value.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub pair: PairSymbol,
    pub market: Market,
    pub bid: Decimal,
    pub ask: Decimal,
    /// Rolling 24h volume as reported by the exchange.
    pub volume_24h: Decimal,
    /// Exchange-side timestamp of the update.
    pub timestamp: DateTime<Utc>,
    /// Funding rate for the current period as a fraction (`0.0001` = 0.01%).
    ///
    /// Only futures frames carry it, and not every one of them does.
    pub funding_rate: Option<Decimal>,
}

impl Quote {
    /// True when this quote came from the spot market.
    #[must_use]
    pub fn is_spot(&self) -> bool {
        self.market == Market::Spot
    }
}
