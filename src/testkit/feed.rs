//! Mock [`FeedTransport`] implementations for testing.
//!
//! - [`ScriptedTransport`] — Pre-loaded connect results and frames.
//!   Best for: single-shard behavior, decode error handling.
//!
//! - [`ChannelFeed`] — Channel-backed transports with an external control
//!   handle per market. Every transport the factory builds for a market
//!   reads the same channel, so frames sent after a reconnect reach the new
//!   connection. Best for: supervisor and reconnection tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::domain::gzip;
use crate::domain::Market;
use crate::error::{Error, Result};
use crate::port::{FeedFrame, FeedTransport, OutboundMessage, TransportFactory};

/// Poll `condition` every 10ms until it holds or `timeout` passes.
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// ---------------------------------------------------------------------------
// ScriptedTransport
// ---------------------------------------------------------------------------

/// A mock transport with scripted connect results and a fixed frame queue.
///
/// Each `connect()` pops the next result (defaults to `Ok(())` when
/// exhausted). Once the frames run out the transport goes quiet.
pub struct ScriptedTransport {
    connect_results: VecDeque<Result<()>>,
    frames: VecDeque<FeedFrame>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    connect_count: Arc<AtomicU32>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            connect_results: VecDeque::new(),
            frames: VecDeque::new(),
            sent: Arc::new(Mutex::new(Vec::new())),
            connect_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_connect_results(mut self, results: Vec<Result<()>>) -> Self {
        self.connect_results = results.into();
        self
    }

    pub fn with_frames(mut self, frames: Vec<FeedFrame>) -> Self {
        self.frames = frames.into();
        self
    }

    /// Shared log of every message sent through this transport.
    pub fn sent_log(&self) -> Arc<Mutex<Vec<OutboundMessage>>> {
        self.sent.clone()
    }

    pub fn connect_count(&self) -> u32 {
        self.connect_count.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedTransport for ScriptedTransport {
    async fn connect(&mut self) -> Result<()> {
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        self.connect_results.pop_front().unwrap_or(Ok(()))
    }

    async fn send(&mut self, message: OutboundMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<FeedFrame> {
        match self.frames.pop_front() {
            Some(frame) => Some(frame),
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {}

    fn name(&self) -> &'static str {
        "scripted"
    }
}

// ---------------------------------------------------------------------------
// ChannelTransport
// ---------------------------------------------------------------------------

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<Option<FeedFrame>>>>;

/// A transport reading frames from a channel shared by every transport the
/// factory builds for one market.
pub struct ChannelTransport {
    frames: SharedReceiver,
    state: Arc<ChannelState>,
    connected: bool,
}

#[derive(Default)]
struct ChannelState {
    connect_count: AtomicU32,
    close_count: AtomicU32,
    failing_connects: AtomicU32,
    sent: Mutex<Vec<OutboundMessage>>,
}

#[async_trait]
impl FeedTransport for ChannelTransport {
    async fn connect(&mut self) -> Result<()> {
        self.state.connect_count.fetch_add(1, Ordering::SeqCst);
        let failing = self.state.failing_connects.load(Ordering::SeqCst);
        if failing > 0 {
            self.state.failing_connects.store(failing - 1, Ordering::SeqCst);
            return Err(Error::Connection("scripted connect failure".into()));
        }
        self.connected = true;
        Ok(())
    }

    async fn send(&mut self, message: OutboundMessage) -> Result<()> {
        if !self.connected {
            return Err(Error::Connection("Not connected".into()));
        }
        self.state.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn next_frame(&mut self) -> Option<FeedFrame> {
        if !self.connected {
            return None;
        }
        match self.frames.lock().await.recv().await {
            Some(Some(frame)) => Some(frame),
            Some(None) | None => None,
        }
    }

    async fn close(&mut self) {
        if self.connected {
            self.connected = false;
            self.state.close_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Control handle for the transports of one market.
#[derive(Clone)]
pub struct ChannelTransportHandle {
    frame_tx: mpsc::Sender<Option<FeedFrame>>,
    frames: SharedReceiver,
    state: Arc<ChannelState>,
}

impl ChannelTransportHandle {
    fn new(buffer: usize) -> Self {
        let (frame_tx, frame_rx) = mpsc::channel(buffer);
        Self {
            frame_tx,
            frames: Arc::new(tokio::sync::Mutex::new(frame_rx)),
            state: Arc::new(ChannelState::default()),
        }
    }

    fn transport(&self) -> ChannelTransport {
        ChannelTransport {
            frames: self.frames.clone(),
            state: self.state.clone(),
            connected: false,
        }
    }

    /// Deliver a raw frame.
    pub async fn send_frame(&self, frame: FeedFrame) {
        let _ = self.frame_tx.send(Some(frame)).await;
    }

    /// Deliver a JSON document as a gzip binary frame.
    pub async fn send_json(&self, json: &str) {
        self.send_frame(FeedFrame::Binary(gzip(json))).await;
    }

    /// Simulate the server closing the connection.
    pub async fn close_remote(&self, reason: &str) {
        self.send_frame(FeedFrame::Closed {
            reason: reason.to_string(),
        })
        .await;
    }

    /// Make the next `n` connect attempts fail.
    pub fn fail_next_connects(&self, n: u32) {
        self.state.failing_connects.store(n, Ordering::SeqCst);
    }

    /// How many times `connect()` was called across all transports.
    pub fn connect_count(&self) -> u32 {
        self.state.connect_count.load(Ordering::SeqCst)
    }

    /// How many connected transports were closed locally.
    pub fn close_count(&self) -> u32 {
        self.state.close_count.load(Ordering::SeqCst)
    }

    /// Every message sent by any transport of this market.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.state.sent.lock().unwrap().clone()
    }
}

/// Channel-backed transports for both markets.
pub struct ChannelFeed {
    pub spot: ChannelTransportHandle,
    pub futures: ChannelTransportHandle,
}

impl ChannelFeed {
    pub fn new(buffer: usize) -> Self {
        Self {
            spot: ChannelTransportHandle::new(buffer),
            futures: ChannelTransportHandle::new(buffer),
        }
    }

    pub fn handle(&self, market: Market) -> &ChannelTransportHandle {
        match market {
            Market::Spot => &self.spot,
            Market::Futures => &self.futures,
        }
    }

    /// Factory building a fresh transport per call, routed by market.
    pub fn factory(&self) -> TransportFactory {
        let spot = self.spot.clone();
        let futures = self.futures.clone();
        Arc::new(move |market| {
            let handle = match market {
                Market::Spot => &spot,
                Market::Futures => &futures,
            };
            Box::new(handle.transport()) as Box<dyn FeedTransport>
        })
    }
}
