//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic: configuration, feed connection management, store
//! synchronization and runtime wiring.
//!
//! # Submodules
//!
//! - [`config`] - Configuration loading and validation
//! - [`feed`] - Sharded feed connections and their supervisor
//! - [`orchestration`] - Runtime orchestration
//! - [`sync`] - Store synchronization task

pub mod config;
pub mod feed;
pub mod orchestration;
pub mod sync;
