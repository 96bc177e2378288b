use serde::Serialize;
use uuid::Uuid;

use crate::models::{ExpenseValidation, RejectRequest, ValidationStatus};
use crate::validations::month::Month;

use super::{ApiClient, ApiError};

#[derive(Debug, Default, Serialize)]
pub struct HistoryQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ValidationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_id: Option<Uuid>,
}

#[derive(Serialize)]
struct MonthQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    month: Option<String>,
}

impl ApiClient {
    pub async fn pending_validations(
        &self,
        token: &str,
        month: Option<Month>,
    ) -> Result<Vec<ExpenseValidation>, ApiError> {
        let query = MonthQuery { month: month.map(Month::query_date) };
        self.get(token, "/expense-validations/pending", &query).await
    }

    pub async fn validation_history(
        &self,
        token: &str,
        query: &HistoryQuery,
    ) -> Result<Vec<ExpenseValidation>, ApiError> {
        self.get(token, "/expense-validations/history", query).await
    }

    /// Synthetic rows for a future month, derived upstream from the active
    /// recurring expenses. None of them has an id.
    pub async fn predicted_validations(
        &self,
        token: &str,
        month: Month,
    ) -> Result<Vec<ExpenseValidation>, ApiError> {
        let query = MonthQuery { month: Some(month.query_date()) };
        self.get(token, "/expense-validations/predicted", &query).await
    }

    pub async fn approve_validation(&self, token: &str, id: Uuid) -> Result<ExpenseValidation, ApiError> {
        let path = format!("/expense-validations/{id}/approve");
        self.post(Some(token), &path, &serde_json::json!({})).await
    }

    pub async fn reject_validation(
        &self,
        token: &str,
        id: Uuid,
        request: &RejectRequest,
    ) -> Result<ExpenseValidation, ApiError> {
        let path = format!("/expense-validations/{id}/reject");
        self.post(Some(token), &path, request).await
    }
}
