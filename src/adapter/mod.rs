//! Implementations of ports (hexagonal adapters).
//!
//! - [`inbound`] - The command-line interface driving the application
//! - [`outbound`] - Exchange feeds and the external store

pub mod inbound;
pub mod outbound;
