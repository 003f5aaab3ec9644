//! Full pipeline: channel-backed feeds in, store actions out.

mod support;

use std::sync::Arc;
use std::time::Duration;

use spreadwatch::adapter::outbound::store::HttpStoreGateway;
use spreadwatch::application::monitor::MonitorHandle;
use spreadwatch::domain::{BlacklistWindow, Market, PairSymbol};
use spreadwatch::infrastructure::config::settings::Config;
use spreadwatch::infrastructure::orchestration::run_with_components;
use spreadwatch::port::{StoreAction, StoreGateway};
use spreadwatch::testkit;
use spreadwatch::testkit::feed::{wait_for, ChannelFeed};
use spreadwatch::testkit::store::RecordingGateway;
use support::store_server::StoreServer;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

const WAIT: Duration = Duration::from_secs(5);

struct Running {
    feed: ChannelFeed,
    handle: MonitorHandle,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<spreadwatch::error::Result<()>>,
}

async fn start(config: Config, gateway: Arc<dyn StoreGateway>) -> Running {
    let feed = ChannelFeed::new(256);
    let (shutdown, shutdown_rx) = watch::channel(false);
    let (ready_tx, ready_rx) = oneshot::channel();
    let factory = feed.factory();
    let task = tokio::spawn(run_with_components(
        config,
        gateway,
        factory,
        shutdown_rx,
        move |handle| {
            let _ = ready_tx.send(handle);
        },
    ));
    let handle = tokio::time::timeout(WAIT, ready_rx).await.unwrap().unwrap();

    let spot = feed.spot.clone();
    let futures = feed.futures.clone();
    assert!(wait_for(WAIT, || spot.connect_count() >= 1 && futures.connect_count() >= 1).await);

    Running {
        feed,
        handle,
        shutdown,
        task,
    }
}

impl Running {
    async fn bbo(&self, market: Market, pair: &str, bid: &str, ask: &str) {
        self.feed
            .handle(market)
            .send_json(&testkit::domain::bbo_json(market, pair, bid, ask))
            .await;
    }

    async fn stop(self) {
        self.shutdown.send(true).unwrap();
        tokio::time::timeout(WAIT, self.task)
            .await
            .expect("runtime stops")
            .unwrap()
            .unwrap();
    }
}

#[tokio::test]
async fn records_reach_the_http_store_and_remote_blacklist_is_merged() {
    let server = StoreServer::start(&["dogeusdt"]).await;
    let mut config = testkit::config::config(&["BTCUSDT", "ETHUSDT"]);
    config.sync.url = server.url.clone();
    config.blacklist.manual = vec![PairSymbol::new("XRPUSDT")];
    let gateway: Arc<dyn StoreGateway> = Arc::new(
        HttpStoreGateway::new(server.url.clone(), "test-secret".into(), Duration::from_secs(2))
            .unwrap(),
    );

    let running = start(config, gateway).await;
    running.bbo(Market::Spot, "BTCUSDT", "100", "100.1").await;
    running.bbo(Market::Futures, "BTCUSDT", "101", "101.2").await;
    running.bbo(Market::Spot, "ETHUSDT", "10", "10.01").await;

    assert!(
        wait_for(WAIT, || server.requests().iter().any(|r| {
            r.action() == "save_opportunities"
                && r.body["data"]
                    .as_array()
                    .is_some_and(|records| !records.is_empty())
        }))
        .await,
        "no opportunities saved: {:?}",
        server.actions()
    );

    let saved = server
        .requests()
        .into_iter()
        .find(|r| r.action() == "save_opportunities" && r.body["data"].as_array().is_some_and(|d| !d.is_empty()))
        .unwrap();
    let record = &saved.body["data"][0];
    assert_eq!(record["pair_symbol"], "BTCUSDT");
    assert_eq!(record["is_active"], true);
    assert!(saved.head.to_ascii_lowercase().contains("x-api-key: test-secret"));

    let top = running.handle.top(5).await.unwrap();
    assert_eq!(top.len(), 1);
    let pending = running.handle.pending().await.unwrap();
    assert!(pending.contains(&PairSymbol::new("ETHUSDT")));

    let blacklist = running.handle.blacklist(BlacklistWindow::OneHour).await.unwrap();
    assert!(blacklist.contains(&PairSymbol::new("DOGEUSDT")));
    assert!(blacklist.contains(&PairSymbol::new("XRPUSDT")));

    running.stop().await;
    assert_eq!(server.actions()[0], "get_blacklist");
}

#[tokio::test]
async fn crossings_are_flushed_on_shutdown() {
    let gateway = Arc::new(RecordingGateway::new());
    let mut config = testkit::config::config(&["SOLUSDT"]);
    config.sync.interval_secs = 3600;

    let running = start(config, gateway.clone()).await;
    running.bbo(Market::Futures, "SOLUSDT", "100", "100.1").await;
    for (bid, ask) in [("100.9", "101"), ("98.9", "99"), ("100.9", "101")] {
        running.bbo(Market::Spot, "SOLUSDT", bid, ask).await;
    }

    let handle = running.handle.clone();
    let mut applied = false;
    for _ in 0..200 {
        if handle.stats().await.unwrap().quotes_applied >= 4 {
            applied = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(applied, "quotes never applied");
    assert!(gateway.accepted().iter().all(|a| *a == StoreAction::GetBlacklist));

    running.stop().await;

    let crossings = gateway.crossings();
    assert_eq!(crossings.len(), 2);
    assert!(crossings.iter().all(|c| c.pair_symbol.as_str() == "SOLUSDT"));
    let batches = gateway.opportunity_batches();
    assert_eq!(batches.len(), 1);
    assert!(batches[0][0].is_active);
}

#[tokio::test]
async fn store_outage_does_not_block_ingestion() {
    let gateway = Arc::new(RecordingGateway::new());
    gateway.set_always_fail(true);
    let config = testkit::config::config(&["BTCUSDT"]);

    let running = start(config, gateway.clone()).await;
    for i in 0..50 {
        let bid = format!("{}", 100 + i);
        let ask = format!("{}.5", 100 + i);
        running.bbo(Market::Spot, "BTCUSDT", &bid, &ask).await;
    }
    running.bbo(Market::Futures, "BTCUSDT", "151", "151.5").await;

    let handle = running.handle.clone();
    let mut applied = 0;
    for _ in 0..300 {
        applied = handle.stats().await.unwrap().quotes_applied;
        if applied >= 51 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(applied, 51);

    running.stop().await;
    assert!(gateway.accepted().is_empty());
}
