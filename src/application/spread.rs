//! Spot/futures spread derivation.
//!
//! All figures are percentages. Fees are taker fees in percent (`0.1` means
//! 0.1%); the funding rate is a per-period fraction as published by the
//! exchange (`0.0001` means 0.01%).
//!
//! - entry (entrada): buy spot, short futures
//! - exit (saida): sell the spot leg, buy back the futures leg

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::{PairSymbol, Quote, SpreadFigures};
use crate::error::CalculationError;

/// Decimal places kept on every derived figure.
pub const SPREAD_SCALE: u32 = 8;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Taker fees applied to the two legs, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeSchedule {
    pub spot_taker_percent: Decimal,
    pub futures_taker_percent: Decimal,
}

impl FeeSchedule {
    #[must_use]
    pub const fn new(spot_taker_percent: Decimal, futures_taker_percent: Decimal) -> Self {
        Self {
            spot_taker_percent,
            futures_taker_percent,
        }
    }

    /// Combined cost of one spot fill and one futures fill.
    #[must_use]
    pub fn round_trip_leg_cost(&self) -> Decimal {
        self.spot_taker_percent + self.futures_taker_percent
    }
}

/// Default fee schedule plus per-pair exceptions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeTable {
    default: FeeSchedule,
    overrides: HashMap<PairSymbol, FeeSchedule>,
}

impl FeeTable {
    #[must_use]
    pub fn new(default: FeeSchedule) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_override(mut self, pair: PairSymbol, schedule: FeeSchedule) -> Self {
        self.overrides.insert(pair, schedule);
        self
    }

    /// Schedule that applies to `pair`.
    #[must_use]
    pub fn schedule_for(&self, pair: &PairSymbol) -> FeeSchedule {
        self.overrides.get(pair).copied().unwrap_or(self.default)
    }
}

/// Stateless spread calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadCalculator;

impl SpreadCalculator {
    /// Gross entry spread: `(futures_ask - spot_bid) / spot_bid * 100`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::ZeroSpotBid`] when `spot_bid` is zero.
    pub fn gross_percent(spot_bid: Decimal, futures_ask: Decimal) -> Result<Decimal, CalculationError> {
        if spot_bid.is_zero() {
            return Err(CalculationError::ZeroSpotBid);
        }
        Ok(((futures_ask - spot_bid) / spot_bid * HUNDRED).round_dp(SPREAD_SCALE))
    }

    /// Gross exit spread, taken on the opposite sides of the books:
    /// `(spot_ask - futures_bid) / futures_bid * 100`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::ZeroFuturesBid`] when `futures_bid` is zero.
    pub fn exit_gross_percent(
        spot_ask: Decimal,
        futures_bid: Decimal,
    ) -> Result<Decimal, CalculationError> {
        if futures_bid.is_zero() {
            return Err(CalculationError::ZeroFuturesBid);
        }
        Ok(((spot_ask - futures_bid) / futures_bid * HUNDRED).round_dp(SPREAD_SCALE))
    }

    /// Derive every spread figure for one spot/futures quote pair.
    ///
    /// The short futures leg receives funding when the rate is positive, so
    /// the period's funding (in percent) is added to the exit figure. Without
    /// an observed rate the funding term is zero.
    ///
    /// # Errors
    ///
    /// Returns a [`CalculationError`] when either bid used as a denominator
    /// is zero.
    pub fn calculate(
        spot: &Quote,
        futures: &Quote,
        fees: &FeeSchedule,
        funding_rate: Option<Decimal>,
    ) -> Result<SpreadFigures, CalculationError> {
        let gross = Self::gross_percent(spot.bid, futures.ask)?;
        let exit_gross = Self::exit_gross_percent(spot.ask, futures.bid)?;
        let fee_cost = fees.round_trip_leg_cost();
        let funding_percent = funding_rate.unwrap_or(Decimal::ZERO) * HUNDRED;

        let entrada = (gross - fee_cost).round_dp(SPREAD_SCALE);
        let saida = (exit_gross - fee_cost + funding_percent).round_dp(SPREAD_SCALE);

        Ok(SpreadFigures {
            gross_percent: gross,
            net_percent: entrada,
            net_percent_entrada: entrada,
            net_percent_saida: saida,
        })
    }
}
