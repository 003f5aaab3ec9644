//! External store synchronization configuration.

use serde::Deserialize;

use crate::port::{CrossingAction, OpportunityWriteMode};

/// Environment variable holding the store credential.
pub const SYNC_SECRET_ENV: &str = "SPREADWATCH_SYNC_SECRET";

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Endpoint receiving `{"action", "data"}` requests.
    #[serde(default)]
    pub url: String,
    /// Seconds between batches.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Batches waiting for submission before the oldest is dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Fixed delay between attempts (milliseconds).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Attempts per request before the batch is dropped.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Per-request HTTP timeout (seconds).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub mode: OpportunityWriteMode,
    #[serde(default)]
    pub crossing_action: CrossingAction,
    /// Loaded from [`SYNC_SECRET_ENV`], never from the file.
    #[serde(skip)]
    pub secret: Option<String>,
}

fn default_interval_secs() -> u64 {
    5
}

fn default_queue_capacity() -> usize {
    16
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            interval_secs: default_interval_secs(),
            queue_capacity: default_queue_capacity(),
            retry_delay_ms: default_retry_delay_ms(),
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
            mode: OpportunityWriteMode::default(),
            crossing_action: CrossingAction::default(),
            secret: None,
        }
    }
}
