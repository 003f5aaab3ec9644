//! Application orchestration.
//!
//! Runtime wiring and lifecycle management: the feed, monitor and sync tasks
//! started in order and stopped in reverse.

pub mod health;
pub mod runtime;

pub use health::{health_check, HealthCheck, HealthReport, HealthStatus};
pub use runtime::{
    live_components, monitor_settings, run, run_with_components, run_with_shutdown,
};
