//! Unit of work handed from the monitor to the sync task.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::crossing::CrossingEvent;
use super::opportunity::OpportunityRecord;

/// Everything published on one sync tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncBatch {
    pub id: Uuid,
    /// Records activated by this batch.
    pub opportunities: Vec<OpportunityRecord>,
    /// Crossings detected since the previous batch, oldest first.
    pub crossings: Vec<CrossingEvent>,
    pub created_at: DateTime<Utc>,
}

impl SyncBatch {
    #[must_use]
    pub fn new(opportunities: Vec<OpportunityRecord>, crossings: Vec<CrossingEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            opportunities,
            crossings,
            created_at: Utc::now(),
        }
    }
}
