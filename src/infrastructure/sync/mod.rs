//! Synchronization with the external store.

pub mod client;

pub use client::{check_store, fetch_blacklist, SyncClient, SyncCounters, SyncStats};
