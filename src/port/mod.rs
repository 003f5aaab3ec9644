//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     ▼                                                       ▼
//! ┌──────────────┐                                    ┌──────────────┐
//! │ Feed (WS)    │                                    │ Store (HTTP) │
//! │ Adapter      │                                    │ Adapter      │
//! └──────────────┘                                    └──────────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`FeedTransport`] - one streaming connection to the exchange feed
//! - [`StoreGateway`] - the external store's action contract

pub mod outbound;

pub use outbound::feed::{FeedFrame, FeedTransport, OutboundMessage, TransportFactory};
pub use outbound::store::{CrossingAction, OpportunityWriteMode, StoreAction, StoreGateway};
