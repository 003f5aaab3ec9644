//! Outbound adapters: implementations of the driven ports.

pub mod feed;
pub mod store;
