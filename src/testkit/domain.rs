//! Builders for domain primitives and wire frames used across tests.

use std::io::Write;

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{Market, OpportunityRecord, PairSymbol, Quote};

/// A quote stamped now, with 1000 volume and no funding rate.
pub fn quote(pair: &str, market: Market, bid: Decimal, ask: Decimal) -> Quote {
    quote_at(pair, market, bid, ask, Utc::now())
}

/// A quote with an explicit timestamp.
pub fn quote_at(pair: &str, market: Market, bid: Decimal, ask: Decimal, at: DateTime<Utc>) -> Quote {
    Quote {
        pair: PairSymbol::new(pair),
        market,
        bid,
        ask,
        volume_24h: dec!(1000),
        timestamp: at,
        funding_rate: None,
    }
}

/// Generate `n` pair symbols named `P0USDT`, `P1USDT`, ...
pub fn make_pairs(n: usize) -> Vec<PairSymbol> {
    (0..n).map(|i| PairSymbol::new(format!("P{i}USDT"))).collect()
}

/// An active record with the given net spread.
pub fn record(pair: &str, net_percent: Decimal) -> OpportunityRecord {
    OpportunityRecord {
        pair_symbol: PairSymbol::new(pair),
        spot_bid: dec!(100),
        spot_ask: dec!(100.1),
        futures_bid: dec!(101),
        futures_ask: dec!(101.2),
        spot_volume_24h: dec!(1000),
        futures_volume_24h: dec!(1000),
        spot_taker_fee: dec!(0.1),
        futures_taker_fee: dec!(0.02),
        funding_rate: None,
        spread_gross_percent: net_percent,
        spread_net_percent: net_percent,
        spread_net_percent_entrada: net_percent,
        spread_net_percent_saida: net_percent,
        is_active: true,
        timestamp: Utc::now(),
    }
}

/// Gzip-compress a JSON document the way the exchange does.
pub fn gzip(json: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(json.as_bytes()).expect("write to Vec");
    encoder.finish().expect("finish gzip")
}

/// JSON for a single-pair best bid/ask push.
pub fn bbo_json(market: Market, pair: &str, bid: &str, ask: &str) -> String {
    format!(
        r#"{{"ch":"{market}.{pair}.bbo","ts":{ts},"tick":{{"bid":"{bid}","ask":"{ask}","vol":"1000"}}}}"#,
        ts = Utc::now().timestamp_millis()
    )
}
