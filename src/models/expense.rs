use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::lenient;
use super::user::User;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Currency {
    Brl,
    Usd,
    Other(String),
}

impl From<String> for Currency {
    fn from(code: String) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "BRL" => Currency::Brl,
            "USD" => Currency::Usd,
            _ => Currency::Other(code),
        }
    }
}

impl Currency {
    pub fn code(&self) -> &str {
        match self {
            Currency::Brl => "BRL",
            Currency::Usd => "USD",
            Currency::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseType {
    Recurring,
    OneTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodicity {
    Monthly,
    Quarterly,
    #[serde(alias = "semi_annual")]
    Semiannual,
    Annual,
}

impl Periodicity {
    pub fn label(self) -> &'static str {
        match self {
            Periodicity::Monthly => "Mensal",
            Periodicity::Quarterly => "Trimestral",
            Periodicity::Semiannual => "Semestral",
            Periodicity::Annual => "Anual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    Draft,
    InReview,
    Active,
    CancellationRequested,
    Cancelled,
    Suspended,
    Migrated,
}

impl ExpenseStatus {
    pub const ALL: [ExpenseStatus; 7] = [
        ExpenseStatus::Draft,
        ExpenseStatus::InReview,
        ExpenseStatus::Active,
        ExpenseStatus::CancellationRequested,
        ExpenseStatus::Cancelled,
        ExpenseStatus::Suspended,
        ExpenseStatus::Migrated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExpenseStatus::Draft => "draft",
            ExpenseStatus::InReview => "in_review",
            ExpenseStatus::Active => "active",
            ExpenseStatus::CancellationRequested => "cancellation_requested",
            ExpenseStatus::Cancelled => "cancelled",
            ExpenseStatus::Suspended => "suspended",
            ExpenseStatus::Migrated => "migrated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    pub fn label(self) -> &'static str {
        match self {
            ExpenseStatus::Draft => "Rascunho",
            ExpenseStatus::InReview => "Em revisão",
            ExpenseStatus::Active => "Ativo",
            ExpenseStatus::CancellationRequested => "Cancelamento solicitado",
            ExpenseStatus::Cancelled => "Cancelado",
            ExpenseStatus::Suspended => "Suspenso",
            ExpenseStatus::Migrated => "Migrado",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
}

/// An expense as embedded in validation rows and returned by `/expenses`.
/// Every relation is optional: the embedded shape only carries a subset.
#[derive(Debug, Clone, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub value_brl: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub exchange_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::date")]
    pub exchange_rate_date: Option<NaiveDate>,
    #[serde(default)]
    pub expense_type: Option<ExpenseType>,
    #[serde(default)]
    pub periodicity: Option<Periodicity>,
    #[serde(default, deserialize_with = "lenient::date")]
    pub renewal_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<ExpenseStatus>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub company: Option<Company>,
    #[serde(default)]
    pub department: Option<Department>,
    #[serde(default)]
    pub owner: Option<User>,
    #[serde(default)]
    pub approver: Option<User>,
}

impl Expense {
    pub fn company_id(&self) -> Option<Uuid> {
        self.company.as_ref().map(|company| company.id)
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.owner.as_ref().map(|owner| owner.id)
    }
}

fn active_by_default() -> bool {
    true
}
