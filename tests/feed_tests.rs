//! Supervisor and shard behavior over channel-backed transports.

use std::time::Duration;

use rust_decimal_macros::dec;
use spreadwatch::domain::{Market, PairSymbol, Quote};
use spreadwatch::infrastructure::feed::{Connectivity, ConnectionSupervisor, ShardState};
use spreadwatch::port::{FeedFrame, OutboundMessage};
use spreadwatch::testkit;
use spreadwatch::testkit::feed::{wait_for, ChannelFeed};
use tokio::sync::mpsc;

const WAIT: Duration = Duration::from_secs(3);

fn pairs(names: &[&str]) -> Vec<PairSymbol> {
    names.iter().map(PairSymbol::new).collect()
}

async fn next_quote(rx: &mut mpsc::Receiver<Quote>) -> Quote {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("quote within timeout")
        .expect("quote channel open")
}

async fn wait_connected(feed: &ChannelFeed, market: Market, count: u32) {
    let handle = feed.handle(market).clone();
    assert!(
        wait_for(WAIT, || handle.connect_count() >= count).await,
        "{market} never reached {count} connects"
    );
}

#[tokio::test]
async fn one_shard_per_market_subscribes_its_pairs() {
    let feed = ChannelFeed::new(64);
    let (mut supervisor, _quotes) = ConnectionSupervisor::start(
        &pairs(&["BTCUSDT", "ETHUSDT"]),
        &testkit::config::feed(50, 10),
        feed.factory(),
    )
    .unwrap();

    let spot = feed.spot.clone();
    let futures = feed.futures.clone();
    assert!(wait_for(WAIT, || !spot.sent().is_empty() && !futures.sent().is_empty()).await);

    match &feed.spot.sent()[0] {
        OutboundMessage::Subscribe {
            market,
            pairs,
            request_id,
        } => {
            assert_eq!(*market, Market::Spot);
            assert_eq!(pairs.len(), 2);
            assert_eq!(request_id, "spot-0-1");
        }
        other => panic!("expected subscribe, got {other:?}"),
    }

    let ids: Vec<String> = supervisor.shard_states().into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec!["spot-0", "futures-0"]);
    supervisor.stop().await;
}

#[tokio::test]
async fn quotes_from_both_markets_reach_the_merged_channel() {
    let feed = ChannelFeed::new(64);
    let (mut supervisor, mut quotes) = ConnectionSupervisor::start(
        &pairs(&["BTCUSDT"]),
        &testkit::config::feed(50, 10),
        feed.factory(),
    )
    .unwrap();
    wait_connected(&feed, Market::Spot, 1).await;
    wait_connected(&feed, Market::Futures, 1).await;

    feed.spot
        .send_json(&testkit::domain::bbo_json(Market::Spot, "BTCUSDT", "100", "100.1"))
        .await;
    let quote = next_quote(&mut quotes).await;
    assert_eq!(quote.market, Market::Spot);
    assert_eq!(quote.bid, dec!(100));

    feed.futures
        .send_json(&testkit::domain::bbo_json(Market::Futures, "BTCUSDT", "101", "101.2"))
        .await;
    let quote = next_quote(&mut quotes).await;
    assert_eq!(quote.market, Market::Futures);
    assert_eq!(quote.ask, dec!(101.2));

    assert!(wait_for(WAIT, || supervisor.stats().quotes_forwarded == 2).await);
    supervisor.stop().await;
}

#[tokio::test]
async fn scenario_e_corrupt_frame_is_skipped() {
    let feed = ChannelFeed::new(64);
    let (mut supervisor, mut quotes) = ConnectionSupervisor::start(
        &pairs(&["BTCUSDT"]),
        &testkit::config::feed(50, 10),
        feed.factory(),
    )
    .unwrap();
    wait_connected(&feed, Market::Spot, 1).await;

    feed.spot
        .send_frame(FeedFrame::Binary(vec![
            0x1f, 0x8b, 0x08, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff,
        ]))
        .await;
    feed.spot
        .send_json(&testkit::domain::bbo_json(Market::Spot, "BTCUSDT", "100", "100.1"))
        .await;

    let quote = next_quote(&mut quotes).await;
    assert_eq!(quote.pair, PairSymbol::new("BTCUSDT"));
    let stats = supervisor.stats();
    assert_eq!(stats.decode_errors, 1);
    assert_eq!(stats.reconnects, 0);
    assert_eq!(feed.spot.connect_count(), 1);
    supervisor.stop().await;
}

#[tokio::test]
async fn server_ping_is_answered_with_pong() {
    let feed = ChannelFeed::new(64);
    let (mut supervisor, _quotes) = ConnectionSupervisor::start(
        &pairs(&["BTCUSDT"]),
        &testkit::config::feed(50, 10),
        feed.factory(),
    )
    .unwrap();
    wait_connected(&feed, Market::Spot, 1).await;

    feed.spot.send_json(r#"{"ping":1700000000000}"#).await;

    let spot = feed.spot.clone();
    assert!(
        wait_for(WAIT, || spot
            .sent()
            .iter()
            .any(|m| *m == OutboundMessage::Pong(1_700_000_000_000)))
        .await
    );
    supervisor.stop().await;
}

#[tokio::test]
async fn scenario_d_remote_close_reconnects_after_delay() {
    let feed = ChannelFeed::new(64);
    let (mut supervisor, mut quotes) = ConnectionSupervisor::start(
        &pairs(&["BTCUSDT"]),
        &testkit::config::feed(50, 10),
        feed.factory(),
    )
    .unwrap();
    wait_connected(&feed, Market::Spot, 1).await;

    feed.spot.close_remote("server restart").await;
    wait_connected(&feed, Market::Spot, 2).await;
    assert_eq!(supervisor.stats().reconnects, 1);

    // The new connection resubscribes and keeps streaming.
    let spot = feed.spot.clone();
    assert!(
        wait_for(WAIT, || spot
            .sent()
            .iter()
            .filter(|m| matches!(m, OutboundMessage::Subscribe { .. }))
            .count()
            == 2)
        .await
    );
    feed.spot
        .send_json(&testkit::domain::bbo_json(Market::Spot, "BTCUSDT", "99", "99.5"))
        .await;
    assert_eq!(next_quote(&mut quotes).await.bid, dec!(99));

    supervisor.stop().await;
}

fn slow_reconnect_config(delay_ms: u64) -> spreadwatch::infrastructure::config::feed::FeedConfig {
    let mut config = testkit::config::feed(50, 10);
    config.reconnect_delay_ms = delay_ms;
    config
}

#[tokio::test]
async fn scenario_d_reconnect_waits_for_the_fixed_delay() {
    let feed = ChannelFeed::new(64);
    let (mut supervisor, _quotes) = ConnectionSupervisor::start(
        &pairs(&["BTCUSDT"]),
        &slow_reconnect_config(600),
        feed.factory(),
    )
    .unwrap();
    wait_connected(&feed, Market::Spot, 1).await;

    let closed_at = tokio::time::Instant::now();
    feed.spot.close_remote("server restart").await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(feed.spot.connect_count(), 1, "reconnected before the delay");
    assert!(supervisor
        .shard_states()
        .iter()
        .any(|(id, state)| id == "spot-0" && *state == ShardState::Reconnecting));

    wait_connected(&feed, Market::Spot, 2).await;
    assert!(closed_at.elapsed() >= Duration::from_millis(600));
    supervisor.stop().await;
}

#[tokio::test]
async fn scenario_d_stop_during_delay_suppresses_reconnect() {
    let feed = ChannelFeed::new(64);
    let (mut supervisor, _quotes) = ConnectionSupervisor::start(
        &pairs(&["BTCUSDT"]),
        &slow_reconnect_config(800),
        feed.factory(),
    )
    .unwrap();
    wait_connected(&feed, Market::Spot, 1).await;

    feed.spot.close_remote("server restart").await;
    assert!(
        wait_for(WAIT, || supervisor
            .shard_states()
            .iter()
            .any(|(_, state)| *state == ShardState::Reconnecting))
        .await
    );

    supervisor.stop().await;
    tokio::time::sleep(Duration::from_millis(1_200)).await;
    assert_eq!(feed.spot.connect_count(), 1);
    assert_eq!(supervisor.stats().reconnects, 1);
}

#[tokio::test]
async fn batch_quotes_for_unsubscribed_pairs_are_dropped() {
    let feed = ChannelFeed::new(64);
    let (mut supervisor, mut quotes) = ConnectionSupervisor::start(
        &pairs(&["BTCUSDT"]),
        &testkit::config::feed(50, 10),
        feed.factory(),
    )
    .unwrap();
    wait_connected(&feed, Market::Spot, 1).await;

    feed.spot
        .send_json(
            r#"{"ch":"spot.tickers","data":[
                {"s":"DOGEUSDT","bid":"0.1","ask":"0.11"},
                {"s":"BTCUSDT","bid":"100","ask":"100.1"},
                {"s":"ETHUSDT","bid":"10","ask":"10.01"}
            ]}"#,
        )
        .await;
    feed.spot
        .send_json(&testkit::domain::bbo_json(Market::Spot, "BTCUSDT", "101", "101.1"))
        .await;

    assert_eq!(next_quote(&mut quotes).await.bid, dec!(100));
    assert_eq!(next_quote(&mut quotes).await.bid, dec!(101));
    assert!(wait_for(WAIT, || supervisor.stats().quotes_forwarded == 2).await);
    assert!(quotes.try_recv().is_err());
    supervisor.stop().await;
}

#[tokio::test]
async fn failed_connects_are_retried() {
    let feed = ChannelFeed::new(64);
    feed.futures.fail_next_connects(2);
    let (mut supervisor, _quotes) = ConnectionSupervisor::start(
        &pairs(&["BTCUSDT"]),
        &testkit::config::feed(50, 10),
        feed.factory(),
    )
    .unwrap();

    wait_connected(&feed, Market::Futures, 3).await;
    assert!(wait_for(WAIT, || supervisor.connectivity() == Connectivity::Online).await);
    let states = supervisor.shard_states();
    assert!(states.iter().all(|(_, state)| *state == ShardState::Open));
    assert_eq!(supervisor.stats().reconnects, 2);
    supervisor.stop().await;
}

#[tokio::test]
async fn no_reconnect_after_stop() {
    let feed = ChannelFeed::new(64);
    let (mut supervisor, mut quotes) = ConnectionSupervisor::start(
        &pairs(&["BTCUSDT"]),
        &testkit::config::feed(50, 10),
        feed.factory(),
    )
    .unwrap();
    wait_connected(&feed, Market::Spot, 1).await;
    wait_connected(&feed, Market::Futures, 1).await;

    supervisor.stop().await;
    assert_eq!(feed.spot.close_count(), 1);
    assert_eq!(feed.futures.close_count(), 1);
    assert!(supervisor.shard_states().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(feed.spot.connect_count(), 1);
    assert_eq!(feed.futures.connect_count(), 1);

    // Every shard dropped its sender.
    assert!(tokio::time::timeout(WAIT, quotes.recv()).await.unwrap().is_none());
}

#[tokio::test]
async fn connectivity_degrades_while_one_market_is_down() {
    let feed = ChannelFeed::new(64);
    feed.futures.fail_next_connects(u32::MAX);
    let (mut supervisor, _quotes) = ConnectionSupervisor::start(
        &pairs(&["BTCUSDT"]),
        &testkit::config::feed(50, 10),
        feed.factory(),
    )
    .unwrap();

    assert!(wait_for(WAIT, || supervisor.connectivity() == Connectivity::Degraded).await);
    let stats = supervisor.stats();
    assert_eq!(stats.shards, 2);
    assert_eq!(stats.open_shards, 1);
    supervisor.stop().await;
}
