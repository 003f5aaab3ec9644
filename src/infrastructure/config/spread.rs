//! Fee, crossing, blacklist and publishing configuration.

use std::collections::HashMap;

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::application::spread::{FeeSchedule, FeeTable};
use crate::application::store::PublishPolicy;
use crate::domain::{BlacklistWindow, PairSymbol};

/// Taker fees in percent, with optional per-pair overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct FeesConfig {
    #[serde(default = "default_spot_taker_percent")]
    pub spot_taker_percent: Decimal,
    #[serde(default = "default_futures_taker_percent")]
    pub futures_taker_percent: Decimal,
    #[serde(default)]
    pub overrides: HashMap<PairSymbol, FeeOverride>,
}

/// Per-pair fee override. Missing fields fall back to the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeeOverride {
    pub spot_taker_percent: Option<Decimal>,
    pub futures_taker_percent: Option<Decimal>,
}

fn default_spot_taker_percent() -> Decimal {
    dec!(0.1)
}

fn default_futures_taker_percent() -> Decimal {
    dec!(0.02)
}

impl FeesConfig {
    /// Effective fee schedule for `pair`.
    #[must_use]
    pub fn schedule_for(&self, pair: &PairSymbol) -> FeeSchedule {
        let over = self.overrides.get(pair);
        FeeSchedule::new(
            over.and_then(|o| o.spot_taker_percent)
                .unwrap_or(self.spot_taker_percent),
            over.and_then(|o| o.futures_taker_percent)
                .unwrap_or(self.futures_taker_percent),
        )
    }

    /// Resolve every override into a lookup table.
    #[must_use]
    pub fn table(&self) -> FeeTable {
        let default = FeeSchedule::new(self.spot_taker_percent, self.futures_taker_percent);
        self.overrides
            .keys()
            .fold(FeeTable::new(default), |table, pair| {
                table.with_override(pair.clone(), self.schedule_for(pair))
            })
    }
}

impl Default for FeesConfig {
    fn default() -> Self {
        Self {
            spot_taker_percent: default_spot_taker_percent(),
            futures_taker_percent: default_futures_taker_percent(),
            overrides: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrossingConfig {
    /// Exit spread level (percent) whose crossing is recorded.
    #[serde(default)]
    pub threshold_percent: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlacklistConfig {
    /// Window reported by default.
    #[serde(default)]
    pub window: BlacklistWindow,
    /// A pair with more crossings than this inside the window is blacklisted.
    #[serde(default = "default_max_crossings")]
    pub max_crossings: usize,
    /// Operator-maintained pairs, always blacklisted.
    #[serde(default)]
    pub manual: Vec<PairSymbol>,
}

fn default_max_crossings() -> usize {
    crate::application::blacklist::DEFAULT_MAX_CROSSINGS
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            window: BlacklistWindow::default(),
            max_crossings: default_max_crossings(),
            manual: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    /// Records older than this are not published (seconds).
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
    /// Optional floor on `spread_net_percent`.
    #[serde(default)]
    pub min_net_spread_percent: Option<Decimal>,
}

fn default_stale_after_secs() -> u64 {
    60
}

impl PublishConfig {
    #[must_use]
    pub fn policy(&self) -> PublishPolicy {
        PublishPolicy {
            stale_after: Duration::seconds(i64::try_from(self.stale_after_secs).unwrap_or(i64::MAX)),
            min_net_spread_percent: self.min_net_spread_percent,
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
            min_net_spread_percent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_replaces_only_named_fee() {
        let mut fees = FeesConfig::default();
        fees.overrides.insert(
            PairSymbol::new("BTCUSDT"),
            FeeOverride {
                spot_taker_percent: Some(Decimal::ZERO),
                futures_taker_percent: None,
            },
        );

        let btc = fees.schedule_for(&PairSymbol::new("BTCUSDT"));
        assert_eq!(btc.spot_taker_percent, Decimal::ZERO);
        assert_eq!(btc.futures_taker_percent, dec!(0.02));

        let eth = fees.schedule_for(&PairSymbol::new("ETHUSDT"));
        assert_eq!(eth.spot_taker_percent, dec!(0.1));

        let table = fees.table();
        assert_eq!(table.schedule_for(&PairSymbol::new("BTCUSDT")), btc);
        assert_eq!(table.schedule_for(&PairSymbol::new("ETHUSDT")), eth);
    }

    #[test]
    fn publish_policy_uses_configured_staleness() {
        let policy = PublishConfig {
            stale_after_secs: 30,
            min_net_spread_percent: Some(dec!(0.5)),
        }
        .policy();
        assert_eq!(policy.stale_after, Duration::seconds(30));
        assert_eq!(policy.min_net_spread_percent, Some(dec!(0.5)));
    }
}
