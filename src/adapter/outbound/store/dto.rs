//! Store action contract wire types.
//!
//! Every request is `POST {url}` with `{"action": <name>, "data": <payload>}`.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::PairSymbol;
use crate::error::SyncError;
use crate::port::StoreAction;

/// Request body for `action`.
pub fn envelope(action: &StoreAction) -> Result<Value, SyncError> {
    let data = match action {
        StoreAction::SaveOpportunities(records) | StoreAction::UpdateOpportunities(records) => {
            Some(serde_json::to_value(records))
        }
        StoreAction::SaveCrossing(event) | StoreAction::RecordCrossing(event) => {
            Some(serde_json::to_value(event))
        }
        StoreAction::GetBlacklist | StoreAction::HealthCheck => None,
    }
    .transpose()
    .map_err(|e| SyncError::Response(format!("failed to encode {}: {e}", action.name())))?;

    Ok(match data {
        Some(data) => json!({ "action": action.name(), "data": data }),
        None => json!({ "action": action.name() }),
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BlacklistEntry {
    Symbol(PairSymbol),
    Record { pair_symbol: PairSymbol },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BlacklistResponse {
    Wrapped { data: Vec<BlacklistEntry> },
    Bare(Vec<BlacklistEntry>),
}

/// Parse a `get_blacklist` response: `{"data": [...]}` or a bare array,
/// entries either symbols or objects with `pair_symbol`.
pub fn parse_blacklist(body: Value) -> Result<Vec<PairSymbol>, SyncError> {
    let response: BlacklistResponse = serde_json::from_value(body)
        .map_err(|e| SyncError::Response(format!("unexpected blacklist payload: {e}")))?;
    let entries = match response {
        BlacklistResponse::Wrapped { data } | BlacklistResponse::Bare(data) => data,
    };
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            BlacklistEntry::Symbol(pair) | BlacklistEntry::Record { pair_symbol: pair } => pair,
        })
        .filter(|pair| !pair.is_empty())
        .collect())
}
