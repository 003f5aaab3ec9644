//! One streaming connection serving a fixed subset of pairs on one market.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use super::state::{SharedCounters, ShardEvent, ShardState};
use crate::adapter::outbound::feed::decoder::{self, DecodedFrame};
use crate::domain::{Market, PairSymbol, Quote};
use crate::port::{FeedFrame, FeedTransport, OutboundMessage, TransportFactory};

/// Timing knobs of a shard.
#[derive(Debug, Clone, Copy)]
pub struct ShardTiming {
    pub heartbeat_interval: Duration,
    pub reconnect_delay: Duration,
}

/// Why a streaming session ended.
#[derive(Debug)]
enum SessionEnd {
    /// Stop was requested locally.
    Stopped,
    /// The server side went away.
    Remote(String),
    /// Nobody is reading quotes any more.
    Downstream,
}

/// A shard task: connect, subscribe, stream, and reconnect until stopped.
pub struct ShardConnection {
    id: String,
    market: Market,
    pairs: Vec<PairSymbol>,
    /// Membership view of `pairs`; quotes for anything else are dropped.
    owned: HashSet<PairSymbol>,
    factory: TransportFactory,
    timing: ShardTiming,
    quote_tx: mpsc::Sender<Quote>,
    stop: watch::Receiver<bool>,
    state: Arc<Mutex<ShardState>>,
    counters: Arc<SharedCounters>,
    subscriptions: u64,
}

impl ShardConnection {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        market: Market,
        pairs: Vec<PairSymbol>,
        factory: TransportFactory,
        timing: ShardTiming,
        quote_tx: mpsc::Sender<Quote>,
        stop: watch::Receiver<bool>,
        counters: Arc<SharedCounters>,
    ) -> Self {
        let owned = pairs.iter().cloned().collect();
        Self {
            id,
            market,
            pairs,
            owned,
            factory,
            timing,
            quote_tx,
            stop,
            state: Arc::new(Mutex::new(ShardState::Connecting)),
            counters,
            subscriptions: 0,
        }
    }

    /// Handle for observing this shard's state from outside the task.
    #[must_use]
    pub fn state_handle(&self) -> Arc<Mutex<ShardState>> {
        self.state.clone()
    }

    fn transition(&self, event: ShardEvent) -> ShardState {
        let mut state = self.state.lock();
        let previous = *state;
        *state = previous.on(event);
        if *state != previous {
            info!(
                shard_id = %self.id,
                market = %self.market,
                from = %previous,
                to = %*state,
                "Shard state changed"
            );
        }
        *state
    }

    fn stop_requested(&self) -> bool {
        *self.stop.borrow()
    }

    /// Run until a stop is requested or the quote channel closes.
    pub async fn run(mut self) {
        debug!(shard_id = %self.id, pairs = self.pairs.len(), "Shard task starting");

        loop {
            if self.stop_requested() {
                self.transition(ShardEvent::StopRequested);
                break;
            }

            let mut transport = (self.factory)(self.market);
            let connected = tokio::select! {
                result = transport.connect() => Some(result),
                () = wait_for_stop(&mut self.stop) => None,
            };

            match connected {
                None => {
                    transport.close().await;
                    self.transition(ShardEvent::StopRequested);
                    break;
                }
                Some(Err(e)) => {
                    warn!(shard_id = %self.id, error = %e, "Connect failed");
                    self.transition(ShardEvent::ConnectFailed);
                }
                Some(Ok(())) => {
                    self.transition(ShardEvent::Connected);
                    match self.session(transport.as_mut()).await {
                        SessionEnd::Stopped | SessionEnd::Downstream => {
                            self.transition(ShardEvent::StopRequested);
                            transport.close().await;
                            self.transition(ShardEvent::SocketClosed);
                            break;
                        }
                        SessionEnd::Remote(reason) => {
                            warn!(shard_id = %self.id, reason = %reason, "Connection closed");
                            self.transition(ShardEvent::RemoteClosed);
                            transport.close().await;
                        }
                    }
                }
            }

            if self.stop_requested() {
                break;
            }
            self.transition(ShardEvent::ReconnectScheduled);
            SharedCounters::bump(&self.counters.reconnects);
            info!(
                shard_id = %self.id,
                delay_ms = self.timing.reconnect_delay.as_millis() as u64,
                "Reconnecting after delay"
            );

            let elapsed = tokio::select! {
                () = tokio::time::sleep(self.timing.reconnect_delay) => true,
                () = wait_for_stop(&mut self.stop) => false,
            };
            if !elapsed {
                self.transition(ShardEvent::StopRequested);
                break;
            }
            self.transition(ShardEvent::DelayElapsed);
        }

        debug!(shard_id = %self.id, "Shard task terminated");
    }

    /// Subscribe, then stream frames until the session ends.
    async fn session(&mut self, transport: &mut dyn FeedTransport) -> SessionEnd {
        self.subscriptions += 1;
        let subscribe = OutboundMessage::Subscribe {
            market: self.market,
            pairs: self.pairs.clone(),
            request_id: format!("{}-{}", self.id, self.subscriptions),
        };
        if let Err(e) = transport.send(subscribe).await {
            return SessionEnd::Remote(format!("subscribe failed: {e}"));
        }
        debug!(shard_id = %self.id, pairs = self.pairs.len(), "Subscribed");

        let period = self.timing.heartbeat_interval;
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let frame = tokio::select! {
                frame = transport.next_frame() => frame,
                _ = heartbeat.tick() => {
                    let ping = OutboundMessage::Ping(epoch_millis());
                    if let Err(e) = transport.send(ping).await {
                        return SessionEnd::Remote(format!("heartbeat failed: {e}"));
                    }
                    trace!(shard_id = %self.id, "Heartbeat sent");
                    continue;
                }
                () = wait_for_stop(&mut self.stop) => return SessionEnd::Stopped,
            };

            let decoded = match frame {
                None => return SessionEnd::Remote("stream ended".into()),
                Some(FeedFrame::Closed { reason }) => return SessionEnd::Remote(reason),
                Some(FeedFrame::Binary(bytes)) => decoder::decode(&bytes),
                Some(FeedFrame::Text(text)) => decoder::decode_text(&text),
            };

            let decoded = match decoded {
                Ok(decoded) => decoded,
                Err(e) => {
                    SharedCounters::bump(&self.counters.decode_errors);
                    warn!(shard_id = %self.id, error = %e, "Dropping undecodable frame");
                    continue;
                }
            };
            SharedCounters::bump(&self.counters.frames_decoded);

            match decoded {
                DecodedFrame::Quotes(quotes) => {
                    if let Some(end) = self.forward(quotes).await {
                        return end;
                    }
                }
                DecodedFrame::Ping(value) => {
                    if let Err(e) = transport.send(OutboundMessage::Pong(value)).await {
                        return SessionEnd::Remote(format!("pong failed: {e}"));
                    }
                }
                DecodedFrame::Ack => debug!(shard_id = %self.id, "Subscription acknowledged"),
                DecodedFrame::ServerError(message) => {
                    warn!(shard_id = %self.id, message = %message, "Server reported an error");
                }
            }
        }
    }

    /// Forward quotes in arrival order, waiting for channel capacity.
    ///
    /// Only pairs this shard subscribed to are forwarded, so each pair keeps
    /// a single source per market even when a batch channel fans out wider.
    async fn forward(&mut self, quotes: Vec<Quote>) -> Option<SessionEnd> {
        for quote in quotes {
            if !self.owned.contains(&quote.pair) {
                trace!(shard_id = %self.id, pair = %quote.pair, "Dropping quote for unowned pair");
                continue;
            }
            trace!(shard_id = %self.id, pair = %quote.pair, "Quote");
            let sent = tokio::select! {
                result = self.quote_tx.send(quote) => result.is_ok(),
                () = wait_for_stop(&mut self.stop) => return Some(SessionEnd::Stopped),
            };
            if !sent {
                debug!(shard_id = %self.id, "Quote channel closed");
                return Some(SessionEnd::Downstream);
            }
            SharedCounters::bump(&self.counters.quotes_forwarded);
        }
        None
    }
}

/// Resolve once stop is requested or the stop sender is gone.
async fn wait_for_stop(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow() {
            return;
        }
        if stop.changed().await.is_err() {
            return;
        }
    }
}

fn epoch_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}
