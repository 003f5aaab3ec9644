//! Configuration and store diagnostic command handlers.

use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration::{health_check, live_components};
use crate::infrastructure::sync::check_store;

/// Validate the configuration file without starting the monitor.
pub fn execute_config<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    let config = Config::load(path)?;

    output::section("Configuration Check");
    output::field("Config", path.display());
    output::success("Configuration file is valid");

    output::section("Summary");
    output::field("Pairs", config.pairs.len());
    output::field(
        "Fees",
        format!(
            "spot {}% / futures {}%",
            config.fees.spot_taker_percent, config.fees.futures_taker_percent
        ),
    );
    output::field("Fee overrides", config.fees.overrides.len());
    output::field("Threshold", format!("{}%", config.crossing.threshold_percent));
    output::field(
        "Blacklist",
        format!(
            "> {} crossings in {}",
            config.blacklist.max_crossings, config.blacklist.window
        ),
    );
    output::field("Sync mode", format!("{:?}", config.sync.mode));

    output::section("Health");
    let report = health_check(&config);
    for check in report.checks() {
        output::health(check);
    }

    if report.is_healthy() {
        output::success("Configuration check complete");
        Ok(())
    } else {
        output::error("Critical health checks failed");
        Err(ConfigError::InvalidValue {
            field: "config",
            reason: "critical health checks failed".to_string(),
        }
        .into())
    }
}

/// Send a health-check action to the configured store.
pub async fn execute_store<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = Config::load(config_path.as_ref())?;
    let (gateway, _) = live_components(&config)?;

    output::section("Store Check");
    output::field("Store", &config.sync.url);

    match check_store(gateway.as_ref()).await {
        Ok(()) => {
            output::success("Store accepted the health check");
            Ok(())
        }
        Err(e) => {
            output::error(&format!("Store check failed: {e}"));
            Err(e.into())
        }
    }
}
