//! Handler for the `run` command.

use std::time::Duration;

use serde_json::json;
use tabled::{Table, Tabled};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::application::monitor::MonitorHandle;
use crate::domain::{BlacklistWindow, OpportunityRecord, PairSymbol};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration::{live_components, run_with_components};

#[derive(Tabled)]
struct OpportunityRow {
    #[tabled(rename = "Pair")]
    pair: String,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "Exit")]
    exit: String,
    #[tabled(rename = "Gross")]
    gross: String,
    #[tabled(rename = "Funding")]
    funding: String,
    #[tabled(rename = "Blacklisted")]
    blacklisted: &'static str,
}

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    apply_overrides(&mut config, args)?;
    if output::is_json() {
        config.logging.format = "json".to_string();
    }
    config.init_logging();

    print_startup(&config, args);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
        }
        let _ = shutdown_tx.send(true);
    });

    let (gateway, factory) = live_components(&config)?;
    let report_interval = Duration::from_secs(args.report_interval);
    let top = args.top;
    let window = args.window.unwrap_or(config.blacklist.window);
    let report_stop = shutdown_rx.clone();

    run_with_components(config, gateway, factory, shutdown_rx, move |handle| {
        if !report_interval.is_zero() {
            tokio::spawn(report_loop(handle, report_interval, top, window, report_stop));
        }
    })
    .await
}

fn apply_overrides(config: &mut Config, args: &RunArgs) -> Result<()> {
    if let Some(raw) = &args.pairs {
        let pairs: Vec<PairSymbol> = raw
            .split(',')
            .map(PairSymbol::new)
            .filter(|pair| !pair.is_empty())
            .collect();
        if pairs.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "pairs",
                reason: "--pairs must name at least one pair".to_string(),
            }
            .into());
        }
        config.pairs = pairs;
    }
    if let Some(secs) = args.sync_interval {
        if secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sync.interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        config.sync.interval_secs = secs;
    }
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    Ok(())
}

fn print_startup(config: &Config, args: &RunArgs) {
    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Config", args.config.display());
    output::field("Pairs", config.pairs.len());
    output::field("Store", &config.sync.url);
    output::field("Sync every", format!("{}s", config.sync.interval_secs));
    if output::verbosity() > 0 {
        output::field("Spot feed", &config.exchange.spot_ws_url);
        output::field("Futures feed", &config.exchange.futures_ws_url);
        output::field("Per shard", config.feed.pairs_per_shard);
    }
}

async fn report_loop(
    handle: MonitorHandle,
    every: Duration,
    top: usize,
    window: BlacklistWindow,
    mut stop: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = stop.changed() => return,
            _ = interval.tick() => {
                let (records, blacklist) = match (handle.top(top).await, handle.blacklist(window).await) {
                    (Ok(records), Ok(blacklist)) => (records, blacklist),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!(error = %e, "Report skipped");
                        return;
                    }
                };
                print_report(&records, |pair| blacklist.contains(pair), window);
            }
        }
    }
}

fn print_report(
    records: &[OpportunityRecord],
    is_blacklisted: impl Fn(&PairSymbol) -> bool,
    window: BlacklistWindow,
) {
    if output::is_json() {
        let rows: Vec<_> = records
            .iter()
            .map(|r| {
                json!({
                    "pair_symbol": r.pair_symbol,
                    "spread_net_percent": r.spread_net_percent.to_string(),
                    "spread_net_percent_saida": r.spread_net_percent_saida.to_string(),
                    "blacklisted": is_blacklisted(&r.pair_symbol),
                })
            })
            .collect();
        output::document(&json!({ "type": "report", "window": window.label(), "top": rows }));
        return;
    }

    output::section(&format!("Top opportunities ({window} blacklist window)"));
    if records.is_empty() {
        output::note("No active opportunities yet");
        return;
    }
    let rows: Vec<_> = records
        .iter()
        .map(|r| OpportunityRow {
            pair: r.pair_symbol.to_string(),
            net: output::spread(r.spread_net_percent),
            exit: output::spread(r.spread_net_percent_saida),
            gross: output::spread(r.spread_gross_percent),
            funding: r
                .funding_rate
                .map_or_else(|| output::muted("-"), |rate| rate.to_string()),
            blacklisted: if is_blacklisted(&r.pair_symbol) { "yes" } else { "" },
        })
        .collect();
    output::table(&Table::new(rows).to_string());
}
