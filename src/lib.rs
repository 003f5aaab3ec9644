//! Spreadwatch - spot/perpetual-futures spread monitoring.
//!
//! Streams best bid/ask quotes for a set of pairs from an exchange's spot and
//! perpetual-futures feeds, keeps one opportunity record per pair, detects
//! when a pair's net exit spread crosses a threshold, derives a rolling-window
//! blacklist from those crossings, and periodically syncs the active records
//! and new crossings to an external store.
//!
//! # Architecture
//!
//! - [`domain`] - Plain data: quotes, opportunity records, crossing events
//! - [`port`] - Traits at the feed and store seams
//! - [`application`] - Spread math, the opportunity store, crossing and
//!   blacklist engines, and the monitor task that owns them
//! - [`adapter`] - WebSocket feed, HTTP store, and the CLI
//! - [`infrastructure`] - Configuration, shard supervision, sync task and
//!   runtime wiring
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use spreadwatch::infrastructure::config::settings::Config;
//! use spreadwatch::infrastructure::orchestration::run;
//!
//! # async fn start() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("config.toml")?;
//! config.init_logging();
//! run(config).await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
