//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`feed`] — Mock [`FeedTransport`](crate::port::FeedTransport)
//!   implementations: `ScriptedTransport`, `ChannelTransport`.
//! - [`store`] — `RecordingGateway`, a [`StoreGateway`](crate::port::StoreGateway)
//!   that records calls and fails on demand.
//! - [`domain`] — Builders for quotes, records and wire frames.
//! - [`config`] — Canonical test configurations.

pub mod config;
pub mod domain;
pub mod feed;
pub mod store;
