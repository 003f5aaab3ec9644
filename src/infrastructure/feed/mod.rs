//! Streaming feed infrastructure: shard connections and their supervisor.

pub mod shard;
pub mod state;
pub mod supervisor;

pub use shard::{ShardConnection, ShardTiming};
pub use state::{SharedCounters, ShardEvent, ShardState};
pub use supervisor::{distribute_pairs, Connectivity, ConnectionSupervisor, SupervisorStats};
