use serde::Deserialize;
use rust_decimal::Decimal;

use super::lenient;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardStats {
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub total_expenses_value: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub monthly_expenses_value: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub average_expense_value: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cancelled_expenses_value: Option<Decimal>,
    #[serde(default)]
    pub pending_validations: i64,
    #[serde(default)]
    pub unread_alerts: i64,
    #[serde(default)]
    pub active_expenses: i64,
    #[serde(default)]
    pub recurring_expenses: i64,
    #[serde(default)]
    pub one_time_expenses: i64,
    #[serde(default)]
    pub upcoming_renewals: i64,
}
