//! Frame decoder: raw feed frames to domain quotes.
//!
//! Stateless and safe to call from every shard concurrently. A frame that
//! fails to decode is reported as a [`DecodeError`]; the caller drops it and
//! keeps reading.

use std::io::Read;

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use rust_decimal::Decimal;
use tracing::warn;

use super::dto::{Channel, WireFrame, WireTick, WireTickerEntry};
use crate::domain::{Market, PairSymbol, Quote};
use crate::error::DecodeError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Upper bound on an inflated frame.
pub const MAX_FRAME_BYTES: u64 = 4 * 1024 * 1024;

/// Outcome of decoding one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedFrame {
    /// Zero or more quotes, in frame order.
    Quotes(Vec<Quote>),
    /// Server heartbeat; must be answered with a pong carrying the value.
    Ping(u64),
    /// Subscription acknowledgement.
    Ack,
    /// The server reported an error.
    ServerError(String),
}

/// Decode a binary frame. Gzip payloads are decompressed first; anything
/// else is read as plain JSON.
pub fn decode(frame: &[u8]) -> Result<DecodedFrame, DecodeError> {
    if frame.starts_with(&GZIP_MAGIC) {
        let json = decompress(frame)?;
        decode_json(&json)
    } else {
        decode_json(frame)
    }
}

/// Decode an uncompressed text frame.
pub fn decode_text(frame: &str) -> Result<DecodedFrame, DecodeError> {
    decode_json(frame.as_bytes())
}

fn decompress(frame: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut decoder = GzDecoder::new(frame).take(MAX_FRAME_BYTES + 1);
    let mut out = Vec::with_capacity(frame.len() * 4);
    decoder.read_to_end(&mut out).map_err(DecodeError::Decompress)?;
    if out.len() as u64 > MAX_FRAME_BYTES {
        return Err(DecodeError::Decompress(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("inflated frame exceeds {MAX_FRAME_BYTES} bytes"),
        )));
    }
    Ok(out)
}

fn decode_json(bytes: &[u8]) -> Result<DecodedFrame, DecodeError> {
    let frame: WireFrame = serde_json::from_slice(bytes)?;

    if let Some(ping) = frame.ping {
        return Ok(DecodedFrame::Ping(ping));
    }

    if let Some(ch) = frame.ch.as_deref() {
        let timestamp = frame_timestamp(frame.ts)?;
        return match ch.parse::<Channel>()? {
            Channel::Bbo { market, pair } => {
                let tick = frame.tick.ok_or_else(|| DecodeError::Schema {
                    reason: format!("channel {ch} without tick"),
                })?;
                quote_from_tick(pair, market, &tick, timestamp).map(|q| DecodedFrame::Quotes(vec![q]))
            }
            Channel::Tickers { market } => {
                let entries = frame.data.ok_or_else(|| DecodeError::Schema {
                    reason: format!("channel {ch} without data"),
                })?;
                decode_batch(market, entries, timestamp)
            }
        };
    }

    match frame.status.as_deref() {
        Some("ok") => Ok(DecodedFrame::Ack),
        Some("error") => Ok(DecodedFrame::ServerError(
            frame.err_msg.unwrap_or_else(|| "unspecified server error".into()),
        )),
        Some(other) => Err(DecodeError::Schema {
            reason: format!("unknown status '{other}'"),
        }),
        None => Err(DecodeError::Schema {
            reason: "frame has neither channel, ping nor status".into(),
        }),
    }
}

/// Decode each batch entry on its own. Bad entries are skipped; the batch
/// fails only when every entry does.
fn decode_batch(
    market: Market,
    entries: Vec<serde_json::Value>,
    timestamp: DateTime<Utc>,
) -> Result<DecodedFrame, DecodeError> {
    let total = entries.len();
    let mut quotes = Vec::with_capacity(total);
    let mut first_error = None;

    for entry in entries {
        match decode_entry(market, entry, timestamp) {
            Ok(quote) => quotes.push(quote),
            Err(e) => {
                warn!(market = %market, error = %e, "Skipping malformed batch entry");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if quotes.is_empty() => Err(e),
        _ => Ok(DecodedFrame::Quotes(quotes)),
    }
}

fn decode_entry(
    market: Market,
    entry: serde_json::Value,
    timestamp: DateTime<Utc>,
) -> Result<Quote, DecodeError> {
    let entry: WireTickerEntry = serde_json::from_value(entry)?;
    let pair = PairSymbol::new(&entry.s);
    if pair.is_empty() {
        return Err(DecodeError::Schema {
            reason: "batch entry without symbol".into(),
        });
    }
    let timestamp = match entry.t {
        Some(ms) => frame_timestamp(Some(ms))?,
        None => timestamp,
    };
    let tick = WireTick {
        bid: entry.bid,
        ask: entry.ask,
        vol: entry.vol,
        fr: entry.fr,
    };
    quote_from_tick(pair, market, &tick, timestamp)
}

fn quote_from_tick(
    pair: PairSymbol,
    market: Market,
    tick: &WireTick,
    timestamp: DateTime<Utc>,
) -> Result<Quote, DecodeError> {
    let bid = tick.bid.to_decimal("bid")?;
    let ask = tick.ask.to_decimal("ask")?;
    if bid <= Decimal::ZERO || ask <= Decimal::ZERO {
        return Err(DecodeError::Schema {
            reason: format!("{pair}: non-positive price (bid {bid}, ask {ask})"),
        });
    }
    if bid > ask {
        return Err(DecodeError::Schema {
            reason: format!("{pair}: crossed book (bid {bid} > ask {ask})"),
        });
    }

    let volume_24h = tick
        .vol
        .as_ref()
        .map(|v| v.to_decimal("vol"))
        .transpose()?
        .unwrap_or(Decimal::ZERO);
    let funding_rate = match market {
        Market::Futures => tick.fr.as_ref().map(|v| v.to_decimal("fr")).transpose()?,
        Market::Spot => None,
    };

    Ok(Quote {
        pair,
        market,
        bid,
        ask,
        volume_24h,
        timestamp,
        funding_rate,
    })
}

fn frame_timestamp(ts: Option<i64>) -> Result<DateTime<Utc>, DecodeError> {
    match ts {
        None => Ok(Utc::now()),
        Some(ms) => DateTime::from_timestamp_millis(ms).ok_or_else(|| DecodeError::Schema {
            reason: format!("timestamp out of range: {ms}"),
        }),
    }
}
