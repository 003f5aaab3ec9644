//! In-memory [`StoreGateway`] that records every call.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{CrossingEvent, OpportunityRecord};
use crate::error::SyncError;
use crate::port::{StoreAction, StoreGateway};

/// Records accepted calls and every attempt; fails on demand with a 503.
#[derive(Default)]
pub struct RecordingGateway {
    accepted: Mutex<Vec<StoreAction>>,
    attempts: AtomicU32,
    failing_calls: AtomicU32,
    always_fail: AtomicBool,
    response: Mutex<Value>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body returned by every successful call.
    pub fn with_response(self, response: Value) -> Self {
        *self.response.lock().unwrap() = response;
        self
    }

    /// Make the next `n` calls fail.
    pub fn fail_next(&self, n: u32) {
        self.failing_calls.store(n, Ordering::SeqCst);
    }

    /// Make every call fail until switched off.
    pub fn set_always_fail(&self, fail: bool) {
        self.always_fail.store(fail, Ordering::SeqCst);
    }

    /// Successful calls, in order.
    pub fn accepted(&self) -> Vec<StoreAction> {
        self.accepted.lock().unwrap().clone()
    }

    /// Every call, including failed ones.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Opportunity batches that were accepted.
    pub fn opportunity_batches(&self) -> Vec<Vec<OpportunityRecord>> {
        self.accepted()
            .into_iter()
            .filter_map(|a| match a {
                StoreAction::SaveOpportunities(r) | StoreAction::UpdateOpportunities(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// Crossing events that were accepted.
    pub fn crossings(&self) -> Vec<CrossingEvent> {
        self.accepted()
            .into_iter()
            .filter_map(|a| match a {
                StoreAction::SaveCrossing(e) | StoreAction::RecordCrossing(e) => Some(e),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl StoreGateway for RecordingGateway {
    async fn call(&self, action: &StoreAction) -> Result<Value, SyncError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let failing = self.failing_calls.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_calls.store(failing - 1, Ordering::SeqCst);
            return Err(unavailable());
        }
        if self.always_fail.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        self.accepted.lock().unwrap().push(action.clone());
        Ok(self.response.lock().unwrap().clone())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

fn unavailable() -> SyncError {
    SyncError::Status {
        status: 503,
        body: "unavailable".into(),
    }
}
