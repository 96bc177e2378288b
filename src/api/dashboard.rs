use serde::Serialize;

use crate::models::{DashboardStats, Expense, ExpenseStatus};

use super::client::NO_QUERY;
use super::{ApiClient, ApiError};

#[derive(Debug, Default, Clone, Serialize)]
pub struct ExpenseQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ExpenseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

impl ApiClient {
    pub async fn dashboard_stats(&self, token: &str) -> Result<DashboardStats, ApiError> {
        self.get(token, "/dashboard/stats", NO_QUERY).await
    }

    pub async fn expenses(&self, token: &str, query: &ExpenseQuery) -> Result<Vec<Expense>, ApiError> {
        self.get(token, "/expenses", query).await
    }
}
