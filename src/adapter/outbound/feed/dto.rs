//! Exchange feed wire types.
//!
//! Server pushes are JSON documents, gzip-compressed on binary frames:
//! ```json
//! {"ch":"spot.BTCUSDT.bbo","ts":1700000000000,"tick":{"bid":"100.0","ask":"100.1","vol":"12345.6"}}
//! {"ch":"futures.tickers","ts":1700000000000,"data":[{"s":"BTCUSDT","bid":"101","ask":"101.2","fr":"0.0001"}]}
//! {"ping":1700000000000}
//! ```

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Market, PairSymbol};
use crate::error::DecodeError;

/// Any document the server may push. Fields are optional because the
/// control and data shapes share one envelope.
#[derive(Debug, Default, Deserialize)]
pub struct WireFrame {
    pub ch: Option<String>,
    pub ts: Option<i64>,
    pub tick: Option<WireTick>,
    /// Batch entries, kept raw so one malformed entry spoils only itself.
    pub data: Option<Vec<serde_json::Value>>,
    pub ping: Option<u64>,
    pub id: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "err-msg")]
    pub err_msg: Option<String>,
    pub subbed: Option<String>,
}

/// Best bid/ask payload of a single-pair channel.
#[derive(Debug, Deserialize)]
pub struct WireTick {
    pub bid: WireNumber,
    pub ask: WireNumber,
    pub vol: Option<WireNumber>,
    pub fr: Option<WireNumber>,
}

/// One entry of a `<market>.tickers` batch.
#[derive(Debug, Deserialize)]
pub struct WireTickerEntry {
    pub s: String,
    pub bid: WireNumber,
    pub ask: WireNumber,
    pub vol: Option<WireNumber>,
    pub fr: Option<WireNumber>,
    /// Per-entry timestamp, overrides the frame's `ts`.
    pub t: Option<i64>,
}

/// Exchanges send numbers both as JSON numbers and as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireNumber {
    Text(String),
    Number(serde_json::Number),
}

impl WireNumber {
    /// Parse into a decimal, accepting scientific notation.
    pub fn to_decimal(&self, field: &'static str) -> Result<Decimal, DecodeError> {
        let raw = match self {
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => n.to_string(),
        };
        Decimal::from_str(&raw)
            .or_else(|_| Decimal::from_scientific(&raw))
            .map_err(|_| DecodeError::InvalidPrice { field, value: raw })
    }
}

/// Parsed `ch` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// `<market>.<PAIR>.bbo`
    Bbo { market: Market, pair: PairSymbol },
    /// `<market>.tickers`
    Tickers { market: Market },
}

impl FromStr for Channel {
    type Err = DecodeError;

    fn from_str(ch: &str) -> Result<Self, Self::Err> {
        let unknown = || DecodeError::UnknownChannel(ch.to_string());
        let mut parts = ch.split('.');
        let market = parts
            .next()
            .and_then(|m| m.parse::<Market>().ok())
            .ok_or_else(unknown)?;

        match (parts.next(), parts.next(), parts.next()) {
            (Some("tickers"), None, None) => Ok(Self::Tickers { market }),
            (Some(pair), Some("bbo"), None) if !pair.is_empty() => Ok(Self::Bbo {
                market,
                pair: PairSymbol::new(pair),
            }),
            _ => Err(unknown()),
        }
    }
}

/// Subscription request, one per pair.
#[derive(Debug, Serialize)]
pub struct SubscribeRequest {
    pub sub: String,
    pub id: String,
}

impl SubscribeRequest {
    pub fn new(market: Market, pair: &PairSymbol, id: String) -> Self {
        Self {
            sub: format!("{}.{}.bbo", market.as_str(), pair),
            id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PingMessage {
    pub ping: u64,
}

#[derive(Debug, Serialize)]
pub struct PongMessage {
    pub pong: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn wire_number_accepts_strings_numbers_and_exponents() {
        let text: WireNumber = serde_json::from_str(r#""100.25""#).unwrap();
        let number: WireNumber = serde_json::from_str("100.25").unwrap();
        let sci: WireNumber = serde_json::from_str("1e-4").unwrap();

        assert_eq!(text.to_decimal("bid").unwrap(), dec!(100.25));
        assert_eq!(number.to_decimal("bid").unwrap(), dec!(100.25));
        assert_eq!(sci.to_decimal("fr").unwrap(), dec!(0.0001));
    }

    #[test]
    fn wire_number_rejects_garbage() {
        let text: WireNumber = serde_json::from_str(r#""abc""#).unwrap();
        assert!(matches!(
            text.to_decimal("ask"),
            Err(DecodeError::InvalidPrice { field: "ask", .. })
        ));
    }

    #[test]
    fn channel_parses_bbo_and_tickers() {
        assert_eq!(
            "spot.btcusdt.bbo".parse::<Channel>().unwrap(),
            Channel::Bbo {
                market: Market::Spot,
                pair: PairSymbol::new("BTCUSDT")
            }
        );
        assert_eq!(
            "futures.tickers".parse::<Channel>().unwrap(),
            Channel::Tickers {
                market: Market::Futures
            }
        );
    }

    #[test]
    fn channel_rejects_unknown_shapes() {
        for ch in ["options.BTCUSDT.bbo", "spot.BTCUSDT.depth", "spot", "spot..bbo"] {
            assert!(
                matches!(ch.parse::<Channel>(), Err(DecodeError::UnknownChannel(_))),
                "{ch}"
            );
        }
    }

    #[test]
    fn subscribe_request_names_bbo_channel() {
        let req = SubscribeRequest::new(Market::Futures, &PairSymbol::new("ETHUSDT"), "futures-0-1".into());
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"sub":"futures.ETHUSDT.bbo","id":"futures-0-1"}"#);
    }
}
