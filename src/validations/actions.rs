use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use log::{info, warn};
use uuid::Uuid;

use crate::api::{ApiClient, ApiError};
use crate::cache::{QueryCache, VALIDATION_MUTATION_FANOUT};
use crate::models::{ExpenseValidation, RejectRequest};

/// Two-step confirmation in front of a reject call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectFlow {
    #[default]
    Idle,
    /// "Was this charge already processed this month?"
    AskingChargedStatus(Uuid),
    /// Destructive-action confirmation, carrying the answer to the question.
    ConfirmingReject { id: Uuid, charged_this_month: bool },
}

impl RejectFlow {
    pub fn start(self, id: Uuid) -> Self {
        RejectFlow::AskingChargedStatus(id)
    }

    pub fn answer(self, charged_this_month: bool) -> Self {
        match self {
            RejectFlow::AskingChargedStatus(id) => {
                RejectFlow::ConfirmingReject { id, charged_this_month }
            }
            other => other,
        }
    }

    pub fn cancel(self) -> Self {
        RejectFlow::Idle
    }

    /// The reject call to fire. Only available once both steps are affirmed.
    pub fn confirmed(self) -> Option<(Uuid, RejectRequest)> {
        match self {
            RejectFlow::ConfirmingReject { id, charged_this_month } => {
                Some((id, RejectRequest { charged_this_month }))
            }
            _ => None,
        }
    }

    pub fn target(self) -> Option<Uuid> {
        match self {
            RejectFlow::Idle => None,
            RejectFlow::AskingChargedStatus(id) => Some(id),
            RejectFlow::ConfirmingReject { id, .. } => Some(id),
        }
    }

    /// Rebuilds the flow from the `reject` / `charged` page parameters.
    pub fn from_params(reject: Option<Uuid>, charged: Option<bool>) -> Self {
        let Some(id) = reject else {
            return RejectFlow::Idle;
        };
        let asking = RejectFlow::Idle.start(id);
        match charged {
            Some(charged_this_month) => asking.answer(charged_this_month),
            None => asking,
        }
    }
}

/// Ids with an approve/reject call outstanding. A claim is taken before the
/// upstream call and released when the claim is dropped.
#[derive(Debug, Default)]
pub struct InFlightActions {
    ids: Mutex<HashSet<Uuid>>,
}

#[derive(Debug)]
pub struct InFlightClaim<'a> {
    registry: &'a InFlightActions,
    id: Uuid,
}

impl InFlightActions {
    pub fn claim(&self, id: Uuid) -> Option<InFlightClaim<'_>> {
        let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
        ids.insert(id).then(|| InFlightClaim { registry: self, id })
    }

    pub fn is_in_flight(&self, id: Uuid) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        self.registry
            .ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("validation is predicted or already settled")]
    NotActionable,
    #[error("another decision for this validation is still in progress")]
    InFlight,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Applies approve/reject decisions and fans the invalidation out to every
/// cached view that could show the affected validation.
pub struct ActionDispatcher<'a> {
    api: &'a ApiClient,
    cache: &'a QueryCache,
    in_flight: &'a InFlightActions,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(api: &'a ApiClient, cache: &'a QueryCache, in_flight: &'a InFlightActions) -> Self {
        Self { api, cache, in_flight }
    }

    pub async fn approve(
        &self,
        token: &str,
        target: &ExpenseValidation,
    ) -> Result<ExpenseValidation, ActionError> {
        let id = target.action_id().ok_or(ActionError::NotActionable)?;
        let _claim = self.in_flight.claim(id).ok_or(ActionError::InFlight)?;

        let updated = self.api.approve_validation(token, id).await.map_err(|err| {
            warn!("approve of validation {} failed: {}", id, err);
            err
        })?;

        let dropped = self.cache.invalidate(&VALIDATION_MUTATION_FANOUT).await;
        info!("validation {} approved, {} cached views invalidated", id, dropped);
        Ok(updated)
    }

    pub async fn reject(
        &self,
        token: &str,
        target: &ExpenseValidation,
        request: RejectRequest,
    ) -> Result<ExpenseValidation, ActionError> {
        let id = target.action_id().ok_or(ActionError::NotActionable)?;
        let _claim = self.in_flight.claim(id).ok_or(ActionError::InFlight)?;

        let updated = self
            .api
            .reject_validation(token, id, &request)
            .await
            .map_err(|err| {
                warn!("reject of validation {} failed: {}", id, err);
                err
            })?;

        let dropped = self.cache.invalidate(&VALIDATION_MUTATION_FANOUT).await;
        info!(
            "validation {} rejected (charged_this_month={}), {} cached views invalidated",
            id, request.charged_this_month, dropped
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_needs_both_steps() {
        let id = Uuid::new_v4();
        let flow = RejectFlow::Idle.start(id);
        assert_eq!(flow, RejectFlow::AskingChargedStatus(id));
        assert_eq!(flow.confirmed(), None);

        let flow = flow.answer(true);
        assert_eq!(flow, RejectFlow::ConfirmingReject { id, charged_this_month: true });
        let (target, request) = flow.confirmed().expect("confirmed");
        assert_eq!(target, id);
        assert!(request.charged_this_month);
    }

    #[test]
    fn answering_outside_the_question_changes_nothing() {
        assert_eq!(RejectFlow::Idle.answer(false), RejectFlow::Idle);
        let confirming = RejectFlow::ConfirmingReject { id: Uuid::new_v4(), charged_this_month: false };
        assert_eq!(confirming.answer(true), confirming);
    }

    #[test]
    fn cancel_returns_to_idle_from_any_step() {
        let id = Uuid::new_v4();
        assert_eq!(RejectFlow::Idle.start(id).cancel(), RejectFlow::Idle);
        assert_eq!(RejectFlow::Idle.start(id).answer(false).cancel(), RejectFlow::Idle);
    }

    #[test]
    fn page_parameters_rebuild_the_flow() {
        let id = Uuid::new_v4();
        assert_eq!(RejectFlow::from_params(None, Some(true)), RejectFlow::Idle);
        assert_eq!(RejectFlow::from_params(Some(id), None), RejectFlow::AskingChargedStatus(id));
        assert_eq!(
            RejectFlow::from_params(Some(id), Some(false)),
            RejectFlow::ConfirmingReject { id, charged_this_month: false }
        );
    }

    #[test]
    fn a_second_claim_is_refused_until_the_first_is_released() {
        let registry = InFlightActions::default();
        let id = Uuid::new_v4();

        let first = registry.claim(id).expect("first claim");
        assert!(registry.claim(id).is_none());
        assert!(registry.is_in_flight(id));
        assert!(registry.claim(Uuid::new_v4()).is_some());

        drop(first);
        assert!(!registry.is_in_flight(id));
        assert!(registry.claim(id).is_some());
    }
}
