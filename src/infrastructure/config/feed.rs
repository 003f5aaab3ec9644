//! Exchange endpoints and feed sharding configuration.

use serde::Deserialize;

/// Streaming endpoints, one per market.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExchangeConfig {
    /// WebSocket URL of the spot best bid/ask feed.
    #[serde(default)]
    pub spot_ws_url: String,
    /// WebSocket URL of the perpetual futures feed.
    #[serde(default)]
    pub futures_ws_url: String,
}

/// How pairs are split across connections and how each connection behaves.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Pairs subscribed on one connection.
    #[serde(default = "default_pairs_per_shard")]
    pub pairs_per_shard: usize,
    /// Connection cap per market. Pairs beyond the cap join the last shard.
    #[serde(default = "default_max_shards_per_market")]
    pub max_shards_per_market: usize,
    /// Capacity of the merged quote channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Client heartbeat interval (seconds).
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Fixed delay before a reconnect attempt (milliseconds).
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_pairs_per_shard() -> usize {
    50
}

fn default_max_shards_per_market() -> usize {
    10
}

fn default_channel_capacity() -> usize {
    10_000
}

fn default_heartbeat_interval_secs() -> u64 {
    20
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            pairs_per_shard: default_pairs_per_shard(),
            max_shards_per_market: default_max_shards_per_market(),
            channel_capacity: default_channel_capacity(),
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}
