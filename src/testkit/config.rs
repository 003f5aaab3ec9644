//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use crate::infrastructure::config::feed::{ExchangeConfig, FeedConfig};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::config::sync::SyncConfig;
use crate::domain::PairSymbol;

/// Feed config with short timings so reconnection tests finish quickly.
pub fn feed(pairs_per_shard: usize, max_shards_per_market: usize) -> FeedConfig {
    FeedConfig {
        pairs_per_shard,
        max_shards_per_market,
        channel_capacity: 1_000,
        heartbeat_interval_secs: 3600,
        reconnect_delay_ms: 50,
    }
}

/// Sync config with no retry delay.
pub fn sync() -> SyncConfig {
    SyncConfig {
        url: "http://127.0.0.1:9/store".into(),
        interval_secs: 1,
        queue_capacity: 4,
        retry_delay_ms: 0,
        max_attempts: 3,
        request_timeout_secs: 1,
        secret: Some("test-secret".into()),
        ..SyncConfig::default()
    }
}

/// A complete, valid configuration for `pairs`.
pub fn config(pairs: &[&str]) -> Config {
    Config {
        pairs: pairs.iter().map(PairSymbol::new).collect(),
        exchange: ExchangeConfig {
            spot_ws_url: "wss://spot.example.com/ws".into(),
            futures_ws_url: "wss://futures.example.com/ws".into(),
        },
        feed: feed(50, 10),
        sync: sync(),
        ..Config::default()
    }
}
