use std::fmt;

use chrono::NaiveDate;

use crate::models::ValidationStatus;

use super::month::Month;

/// Status tab of the validation board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusTab {
    #[default]
    Pending,
    Approved,
    Rejected,
    All,
}

impl StatusTab {
    pub const ALL: [StatusTab; 4] = [
        StatusTab::Pending,
        StatusTab::Approved,
        StatusTab::Rejected,
        StatusTab::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusTab::Pending => "pending",
            StatusTab::Approved => "approved",
            StatusTab::Rejected => "rejected",
            StatusTab::All => "all",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusTab::Pending => "Pendentes",
            StatusTab::Approved => "Aprovadas",
            StatusTab::Rejected => "Rejeitadas",
            StatusTab::All => "Todas",
        }
    }

    /// Unknown or empty values fall back to the pending tab.
    pub fn parse(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|tab| tab.as_str() == value.trim())
            .unwrap_or_default()
    }

    pub fn status(self) -> Option<ValidationStatus> {
        match self {
            StatusTab::Pending => Some(ValidationStatus::Pending),
            StatusTab::Approved => Some(ValidationStatus::Approved),
            StatusTab::Rejected => Some(ValidationStatus::Rejected),
            StatusTab::All => None,
        }
    }
}

impl fmt::Display for StatusTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the rows of a board come from. Chosen once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchPlan {
    /// Synthetic rows for a future month; nothing exists upstream yet.
    Predicted(Month),
    Historical { month: Month, tab: StatusTab },
}

impl FetchPlan {
    pub fn select(month: Month, tab: StatusTab, today: NaiveDate) -> Self {
        if month.is_future(today) {
            FetchPlan::Predicted(month)
        } else {
            FetchPlan::Historical { month, tab }
        }
    }

    pub fn month(&self) -> Month {
        match *self {
            FetchPlan::Predicted(month) => month,
            FetchPlan::Historical { month, .. } => month,
        }
    }

    pub fn is_predicted(&self) -> bool {
        matches!(self, FetchPlan::Predicted(_))
    }
}
