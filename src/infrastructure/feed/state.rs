//! Shard connection lifecycle and shared counters.
//!
//! Every state change of a shard goes through [`ShardState::on`], so the
//! lifecycle can be tested without sockets.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Lifecycle of one streaming connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShardState {
    /// A connection attempt is in flight.
    Connecting,
    /// Subscribed and streaming.
    Open,
    /// Stop requested; the socket is being closed.
    Closing,
    /// No socket. Terminal once monitoring stops.
    Closed,
    /// Waiting out the fixed delay before the next attempt.
    Reconnecting,
}

/// Inputs that drive [`ShardState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardEvent {
    Connected,
    ConnectFailed,
    /// The server closed the socket or the stream failed.
    RemoteClosed,
    StopRequested,
    /// The local close handshake finished.
    SocketClosed,
    /// The shard decided to try again while monitoring is active.
    ReconnectScheduled,
    DelayElapsed,
}

impl ShardState {
    /// Apply `event`. Pairs with no defined transition leave the state as is.
    #[must_use]
    pub fn on(self, event: ShardEvent) -> Self {
        use ShardEvent as E;
        use ShardState as S;

        match (self, event) {
            (S::Connecting, E::Connected) => S::Open,
            (S::Connecting, E::ConnectFailed | E::StopRequested) => S::Closed,
            (S::Open, E::RemoteClosed) => S::Closed,
            (S::Open, E::StopRequested) => S::Closing,
            (S::Closing, E::SocketClosed | E::RemoteClosed) => S::Closed,
            (S::Closed, E::ReconnectScheduled) => S::Reconnecting,
            (S::Reconnecting, E::DelayElapsed) => S::Connecting,
            (S::Reconnecting, E::StopRequested) => S::Closed,
            (state, event) => {
                debug!(?state, ?event, "Ignoring event with no transition");
                state
            }
        }
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Reconnecting => "reconnecting",
        }
    }
}

impl fmt::Display for ShardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters shared by every shard of a supervisor.
#[derive(Debug, Default)]
pub struct SharedCounters {
    /// Reconnect attempts scheduled after a close or failed connect.
    pub(crate) reconnects: AtomicU64,
    /// Frames that decoded successfully.
    pub(crate) frames_decoded: AtomicU64,
    /// Frames dropped because they failed to decode.
    pub(crate) decode_errors: AtomicU64,
    /// Quotes handed to the merged channel.
    pub(crate) quotes_forwarded: AtomicU64,
}

impl SharedCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}
