use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{Datelike, Days, NaiveDate};

use super::expense::Expense;
use super::lenient;
use super::user::User;

/// Days after the first of the month during which a pending validation is
/// still on time.
pub const OVERDUE_GRACE_DAYS: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ValidationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Pending => "pending",
            ValidationStatus::Approved => "approved",
            ValidationStatus::Rejected => "rejected",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ValidationStatus::Pending => "Pendente",
            ValidationStatus::Approved => "Aprovada",
            ValidationStatus::Rejected => "Rejeitada",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseValidation {
    /// Absent for predicted rows that do not exist upstream yet.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub expense_id: Uuid,
    #[serde(default)]
    pub validator_id: Option<Uuid>,
    pub validation_month: NaiveDate,
    pub status: ValidationStatus,
    #[serde(default, rename = "validated_at", deserialize_with = "lenient::date")]
    pub validated_on: Option<NaiveDate>,
    #[serde(default)]
    pub is_overdue: bool,
    #[serde(default)]
    pub is_predicted: bool,
    #[serde(default)]
    pub expense: Option<Expense>,
    #[serde(default)]
    pub validator: Option<User>,
}

impl ExpenseValidation {
    /// The id an approve/reject call may target. Predicted rows never have one,
    /// whatever their status says.
    pub fn action_id(&self) -> Option<Uuid> {
        if self.is_predicted || self.status != ValidationStatus::Pending {
            return None;
        }
        self.id
    }

    pub fn is_actionable(&self) -> bool {
        self.action_id().is_some()
    }

    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        if self.status != ValidationStatus::Pending || self.is_predicted {
            return false;
        }
        self.is_overdue || grace_elapsed(self.validation_month, today)
    }
}

/// True once `today` is strictly more than the grace window past the first day
/// of `month`'s month.
pub fn grace_elapsed(month: NaiveDate, today: NaiveDate) -> bool {
    let month_start = month - Days::new(u64::from(month.day0()));
    (today - month_start).num_days() > OVERDUE_GRACE_DAYS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RejectRequest {
    pub charged_this_month: bool,
}
