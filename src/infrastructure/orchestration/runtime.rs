//! Monitor runtime lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::adapter::outbound::feed::WebSocketTransport;
use crate::adapter::outbound::store::HttpStoreGateway;
use crate::application::blacklist::ManualBlacklist;
use crate::application::monitor::{Monitor, MonitorHandle, MonitorSettings};
use crate::application::queue::SyncQueue;
use crate::domain::PairSymbol;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::config::sync::SYNC_SECRET_ENV;
use crate::infrastructure::feed::{ConnectionSupervisor, Connectivity};
use crate::infrastructure::sync::{fetch_blacklist, SyncClient};
use crate::port::{StoreGateway, TransportFactory};

const STATUS_INTERVAL: Duration = Duration::from_secs(30);
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Run until the process is killed.
pub async fn run(config: Config) -> Result<()> {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    run_with_shutdown(config, shutdown_rx).await
}

/// Run with externally controlled shutdown signal, using the live
/// WebSocket feeds and the HTTP store.
pub async fn run_with_shutdown(config: Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    let (gateway, factory) = live_components(&config)?;
    run_with_components(config, gateway, factory, shutdown, |_| {}).await
}

/// The HTTP store gateway and WebSocket transport factory for `config`.
///
/// # Errors
///
/// Returns an error if the store credential is missing or the HTTP client
/// cannot be built.
pub fn live_components(config: &Config) -> Result<(Arc<dyn StoreGateway>, TransportFactory)> {
    let secret = config
        .sync
        .secret
        .clone()
        .ok_or(ConfigError::MissingField {
            field: SYNC_SECRET_ENV,
        })?;
    let gateway: Arc<dyn StoreGateway> = Arc::new(HttpStoreGateway::new(
        config.sync.url.clone(),
        secret,
        Duration::from_secs(config.sync.request_timeout_secs),
    )?);
    let factory = WebSocketTransport::factory(
        config.exchange.spot_ws_url.clone(),
        config.exchange.futures_ws_url.clone(),
    );
    Ok((gateway, factory))
}

/// Monitor settings derived from `config`, with `remote` pairs added to the
/// manual blacklist.
#[must_use]
pub fn monitor_settings(config: &Config, remote: Vec<PairSymbol>) -> MonitorSettings {
    let manual = ManualBlacklist::new(config.blacklist.manual.iter().cloned().chain(remote));
    MonitorSettings {
        fees: config.fees.table(),
        publish: config.publish.policy(),
        crossing_threshold: config.crossing.threshold_percent,
        max_crossings: config.blacklist.max_crossings,
        manual_blacklist: manual,
        sync_interval: Duration::from_secs(config.sync.interval_secs),
        prune_interval: PRUNE_INTERVAL,
    }
}

/// Wire and run the pipeline over the given transports and store.
///
/// `on_ready` receives the monitor handle once every task is running.
/// Shutdown order: feed shards first, then the monitor (which publishes a
/// last batch), then the sync task once the queue is drained.
pub async fn run_with_components(
    config: Config,
    gateway: Arc<dyn StoreGateway>,
    factory: TransportFactory,
    mut shutdown: watch::Receiver<bool>,
    on_ready: impl FnOnce(MonitorHandle),
) -> Result<()> {
    info!(
        pairs = config.pairs.len(),
        store = gateway.name(),
        "Starting spreadwatch"
    );

    let remote = match fetch_blacklist(gateway.as_ref()).await {
        Ok(pairs) => {
            info!(pairs = pairs.len(), "Remote blacklist loaded");
            pairs
        }
        Err(e) => {
            warn!(error = %e, "Remote blacklist unavailable, using configured pairs only");
            Vec::new()
        }
    };
    let settings = monitor_settings(&config, remote);

    let queue = SyncQueue::new(config.sync.queue_capacity);
    let (mut supervisor, quotes) = ConnectionSupervisor::start(&config.pairs, &config.feed, factory)?;

    let (pipeline_stop_tx, pipeline_stop_rx) = watch::channel(false);
    let (monitor, handle) = Monitor::new(settings, quotes, queue.clone());
    let mut monitor_task = tokio::spawn(monitor.run(pipeline_stop_rx.clone()));

    let sync = SyncClient::new(gateway, queue.clone(), &config.sync);
    let sync_counters = sync.counters();
    let sync_task = tokio::spawn(sync.run(pipeline_stop_rx));

    on_ready(handle.clone());
    info!("Listening for quotes...");

    let mut status_interval = tokio::time::interval(STATUS_INTERVAL);
    status_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut monitor_finished = false;

    loop {
        tokio::select! {
            result = shutdown.changed() => {
                match result {
                    Ok(()) => {
                        if *shutdown.borrow() {
                            info!("Shutdown signal received");
                            break;
                        }
                    }
                    Err(_) => {
                        info!("Shutdown channel closed");
                        break;
                    }
                }
            }
            _ = status_interval.tick() => {
                let feed = supervisor.stats();
                let sync = sync_counters.snapshot();
                let connectivity = supervisor.connectivity();
                if connectivity != Connectivity::Online {
                    warn!(?connectivity, open = feed.open_shards, shards = feed.shards, "Feed not fully connected");
                }
                match handle.stats().await {
                    Ok(monitor) => info!(
                        ?connectivity,
                        reconnects = feed.reconnects,
                        decode_errors = feed.decode_errors,
                        quotes = monitor.quotes_applied,
                        records = monitor.records,
                        active = monitor.active,
                        pending = monitor.pending_pairs,
                        batches_sent = sync.batches_sent,
                        batches_dropped = sync.batches_dropped + queue.dropped(),
                        "Status"
                    ),
                    Err(e) => warn!(error = %e, "Monitor status unavailable"),
                }
            }
            result = &mut monitor_task => {
                if let Err(e) = result {
                    error!(error = %e, "Monitor task failed");
                } else {
                    warn!("Monitor exited before shutdown");
                }
                monitor_finished = true;
                break;
            }
        }
    }

    // The monitor learns about the stop before its feed goes away.
    let _ = pipeline_stop_tx.send(true);
    supervisor.stop().await;
    if !monitor_finished {
        if let Err(e) = monitor_task.await {
            error!(error = %e, "Monitor task failed");
        }
    }
    // A panicked monitor never closes the queue.
    queue.close();
    if let Err(e) = sync_task.await {
        error!(error = %e, "Sync task failed");
    }

    let sync = sync_counters.snapshot();
    info!(
        batches_sent = sync.batches_sent,
        batches_dropped = sync.batches_dropped + queue.dropped(),
        "Shutdown complete"
    );
    Ok(())
}
