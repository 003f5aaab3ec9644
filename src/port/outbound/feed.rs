//! Feed port: a single streaming connection to the exchange.
//!
//! A transport moves raw frames only. Decoding happens in the shard that owns
//! it, so transports stay trivial and mockable.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Market, PairSymbol};
use crate::error::Result;

/// Raw inbound frame from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedFrame {
    /// Compressed binary payload.
    Binary(Vec<u8>),
    /// Uncompressed text payload.
    Text(String),
    /// The server closed the connection or the socket failed.
    Closed {
        /// The disconnection reason.
        reason: String,
    },
}

/// Client-originated messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Subscribe to best bid/ask for every pair on `market`.
    Subscribe {
        market: Market,
        pairs: Vec<PairSymbol>,
        request_id: String,
    },
    /// Client heartbeat, epoch milliseconds.
    Ping(u64),
    /// Reply to a server ping, echoing its value.
    Pong(u64),
}

/// One streaming connection to the exchange feed.
#[async_trait]
pub trait FeedTransport: Send {
    /// Open the connection.
    async fn connect(&mut self) -> Result<()>;

    /// Send a client message on the open connection.
    async fn send(&mut self, message: OutboundMessage) -> Result<()>;

    /// Wait for the next inbound frame.
    ///
    /// Returns `None` once the underlying stream has ended.
    async fn next_frame(&mut self) -> Option<FeedFrame>;

    /// Close the connection. Safe to call when already closed.
    async fn close(&mut self);

    /// Transport name for logging.
    fn name(&self) -> &'static str;
}

/// Creates a fresh transport for the given market.
///
/// Shards call it on every (re)connect so no socket state leaks between
/// attempts.
pub type TransportFactory = Arc<dyn Fn(Market) -> Box<dyn FeedTransport> + Send + Sync>;
