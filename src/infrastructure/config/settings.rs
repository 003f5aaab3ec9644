//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; the store credential comes only
//! from the `SPREADWATCH_SYNC_SECRET` environment variable.
//!
//! # Example
//!
//! ```no_run
//! use spreadwatch::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::feed::{ExchangeConfig, FeedConfig};
use super::logging::LoggingConfig;
use super::spread::{BlacklistConfig, CrossingConfig, FeesConfig, PublishConfig};
use super::sync::{SyncConfig, SYNC_SECRET_ENV};
use crate::domain::PairSymbol;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Monitored pairs, e.g. `BTCUSDT`. Each is subscribed on both markets.
    #[serde(default)]
    pub pairs: Vec<PairSymbol>,

    /// Streaming endpoints.
    #[serde(default)]
    pub exchange: ExchangeConfig,

    /// Sharding, heartbeat and reconnect settings.
    #[serde(default)]
    pub feed: FeedConfig,

    /// Taker fees used in net spreads.
    #[serde(default)]
    pub fees: FeesConfig,

    #[serde(default)]
    pub crossing: CrossingConfig,

    #[serde(default)]
    pub blacklist: BlacklistConfig,

    /// Which records each sync batch carries.
    #[serde(default)]
    pub publish: PublishConfig,

    /// External store endpoint and cadence.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// Reads the store credential from `SPREADWATCH_SYNC_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, the secret is missing, or
    /// validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with_secret(content, std::env::var(SYNC_SECRET_ENV).ok())
    }

    /// Parse configuration with an explicitly supplied store credential.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml_with_secret(content: &str, secret: Option<String>) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.sync.secret = secret.filter(|s| !s.trim().is_empty());
        config.normalize_pairs();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Drop empty and duplicate pairs, keeping first-seen order.
    fn normalize_pairs(&mut self) {
        let mut seen = BTreeSet::new();
        self.pairs
            .retain(|pair| !pair.is_empty() && seen.insert(pair.clone()));
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.pairs.is_empty() {
            return Err(ConfigError::MissingField { field: "pairs" }.into());
        }

        validate_url("spot_ws_url", &self.exchange.spot_ws_url, &["ws", "wss"])?;
        validate_url("futures_ws_url", &self.exchange.futures_ws_url, &["ws", "wss"])?;
        validate_url("sync.url", &self.sync.url, &["http", "https"])?;

        if self.sync.secret.is_none() {
            return Err(ConfigError::MissingField {
                field: SYNC_SECRET_ENV,
            }
            .into());
        }

        for (field, value) in [
            ("pairs_per_shard", self.feed.pairs_per_shard as u64),
            ("max_shards_per_market", self.feed.max_shards_per_market as u64),
            ("channel_capacity", self.feed.channel_capacity as u64),
            ("heartbeat_interval_secs", self.feed.heartbeat_interval_secs),
            ("sync.interval_secs", self.sync.interval_secs),
            ("sync.queue_capacity", self.sync.queue_capacity as u64),
            ("sync.max_attempts", u64::from(self.sync.max_attempts)),
            ("sync.request_timeout_secs", self.sync.request_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than 0".to_string(),
                }
                .into());
            }
        }

        let mut fees = vec![
            self.fees.spot_taker_percent,
            self.fees.futures_taker_percent,
        ];
        for over in self.fees.overrides.values() {
            fees.extend(over.spot_taker_percent);
            fees.extend(over.futures_taker_percent);
        }
        if fees.iter().any(|fee| *fee < Decimal::ZERO) {
            return Err(ConfigError::InvalidValue {
                field: "fees",
                reason: "taker fees must be 0 or greater".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[allow(clippy::result_large_err)]
fn validate_url(field: &'static str, value: &str, schemes: &[&str]) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField { field }.into());
    }
    let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        field,
        reason: e.to_string(),
    })?;
    if !schemes.contains(&parsed.scheme()) {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("scheme must be one of {}", schemes.join(", ")),
        }
        .into());
    }
    Ok(())
}
