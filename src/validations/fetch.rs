use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;
use uuid::Uuid;

use crate::api::{ApiClient, ApiError, HistoryQuery};
use crate::cache::{QueryCache, QueryKey};
use crate::models::ExpenseValidation;

use super::plan::{FetchPlan, StatusTab};

/// Issues monotonically increasing sequence numbers per session so that only
/// the response to the latest request gets applied.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    next: AtomicU64,
    latest: Mutex<HashMap<Uuid, u64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    scope: Uuid,
    sequence: u64,
}

impl FetchTicket {
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl RequestSequencer {
    pub fn issue(&self, scope: Uuid) -> FetchTicket {
        let sequence = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(scope, sequence);
        FetchTicket { scope, sequence }
    }

    pub fn is_latest(&self, ticket: &FetchTicket) -> bool {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ticket.scope)
            .is_some_and(|latest| *latest == ticket.sequence)
    }
}

/// Runs a plan against the upstream. Rows come back in upstream order.
pub async fn fetch_validations(
    api: &ApiClient,
    token: &str,
    plan: &FetchPlan,
) -> Result<Vec<ExpenseValidation>, ApiError> {
    match *plan {
        FetchPlan::Predicted(month) => api.predicted_validations(token, month).await,
        FetchPlan::Historical { month, tab: StatusTab::Pending } => {
            api.pending_validations(token, Some(month)).await
        }
        FetchPlan::Historical { month, tab } => {
            let query = HistoryQuery {
                status: tab.status(),
                month: Some(month.query_date()),
                expense_id: None,
            };
            api.validation_history(token, &query).await
        }
    }
}

pub struct ValidationFetcher<'a> {
    api: &'a ApiClient,
    cache: &'a QueryCache,
    sequencer: &'a RequestSequencer,
}

impl<'a> ValidationFetcher<'a> {
    pub fn new(api: &'a ApiClient, cache: &'a QueryCache, sequencer: &'a RequestSequencer) -> Self {
        Self { api, cache, sequencer }
    }

    /// Rows for `plan`, from the cache when fresh. A fetched response is only
    /// stored when no newer request was issued for the session meanwhile and
    /// no mutation invalidated the rows while they were in transit.
    pub async fn load(
        &self,
        scope: Uuid,
        token: &str,
        plan: &FetchPlan,
    ) -> Result<Arc<Vec<ExpenseValidation>>, ApiError> {
        let ticket = self.sequencer.issue(scope);
        let key = QueryKey::from(plan);

        if let Some(hit) = self.cache.get::<Vec<ExpenseValidation>>(scope, &key).await {
            return Ok(hit);
        }

        let epoch = self.cache.epoch(key.family).await;
        let rows = Arc::new(fetch_validations(self.api, token, plan).await?);
        if self.sequencer.is_latest(&ticket) {
            self.cache.insert_if_current(scope, key, Arc::clone(&rows), epoch).await;
        } else {
            debug!(
                "response #{} for {:?} superseded by a newer request, not cached",
                ticket.sequence(),
                plan
            );
        }
        Ok(rows)
    }
}
