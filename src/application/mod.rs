//! Application services (use cases).
//!
//! Pure spread math, the per-pair opportunity table, crossing detection,
//! blacklist derivation, and the monitor task that owns all of them.

pub mod blacklist;
pub mod crossing;
pub mod monitor;
pub mod queue;
pub mod spread;
pub mod store;
