//! Exchange-agnostic domain types.
//!
//! Everything here is plain data: quotes flowing in from the feed, the
//! per-pair opportunity record, and crossing events. Behavior lives in
//! [`crate::application`].

pub mod batch;
pub mod crossing;
pub mod id;
pub mod opportunity;
pub mod quote;
pub mod window;

pub use batch::SyncBatch;
pub use crossing::{CrossingDirection, CrossingEvent};
pub use id::PairSymbol;
pub use opportunity::{OpportunityRecord, SpreadFigures};
pub use quote::{Market, Quote};
pub use window::BlacklistWindow;
