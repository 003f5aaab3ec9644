//! Store port: the external store's action-based contract.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{CrossingEvent, OpportunityRecord};
use crate::error::SyncError;

/// How opportunity batches are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityWriteMode {
    /// Deactivate everything, then insert the batch (`save_opportunities`).
    #[default]
    Refresh,
    /// Upsert keyed by pair symbol (`update_opportunities`).
    Upsert,
}

/// Which endpoint variant receives crossing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossingAction {
    #[default]
    SaveCrossing,
    RecordCrossing,
}

/// One request of the action contract.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    SaveOpportunities(Vec<OpportunityRecord>),
    UpdateOpportunities(Vec<OpportunityRecord>),
    SaveCrossing(CrossingEvent),
    RecordCrossing(CrossingEvent),
    GetBlacklist,
    HealthCheck,
}

impl StoreAction {
    /// Opportunity write for the configured mode.
    #[must_use]
    pub fn opportunities(mode: OpportunityWriteMode, records: Vec<OpportunityRecord>) -> Self {
        match mode {
            OpportunityWriteMode::Refresh => Self::SaveOpportunities(records),
            OpportunityWriteMode::Upsert => Self::UpdateOpportunities(records),
        }
    }

    /// Crossing write for the configured endpoint variant.
    #[must_use]
    pub fn crossing(action: CrossingAction, event: CrossingEvent) -> Self {
        match action {
            CrossingAction::SaveCrossing => Self::SaveCrossing(event),
            CrossingAction::RecordCrossing => Self::RecordCrossing(event),
        }
    }

    /// Action name on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SaveOpportunities(_) => "save_opportunities",
            Self::UpdateOpportunities(_) => "update_opportunities",
            Self::SaveCrossing(_) => "save_crossing",
            Self::RecordCrossing(_) => "record_crossing",
            Self::GetBlacklist => "get_blacklist",
            Self::HealthCheck => "health_check",
        }
    }
}

/// Client side of the store contract.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Submit one action and return the decoded JSON response body
    /// (`Value::Null` for an empty body).
    async fn call(&self, action: &StoreAction) -> Result<serde_json::Value, SyncError>;

    /// Gateway name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_match_contract() {
        assert_eq!(
            StoreAction::opportunities(OpportunityWriteMode::Refresh, vec![]).name(),
            "save_opportunities"
        );
        assert_eq!(
            StoreAction::opportunities(OpportunityWriteMode::Upsert, vec![]).name(),
            "update_opportunities"
        );
        assert_eq!(StoreAction::GetBlacklist.name(), "get_blacklist");
        assert_eq!(StoreAction::HealthCheck.name(), "health_check");
    }
}
