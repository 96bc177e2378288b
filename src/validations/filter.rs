use uuid::Uuid;

use crate::models::ExpenseValidation;

/// Narrowing applied to fetched rows. Not part of any cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationFilters {
    pub company_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub service_name: Option<String>,
}

impl ValidationFilters {
    /// Builds filters from raw form values, where an empty string or a value
    /// that is not an id means "all".
    pub fn from_form(company_id: &str, owner_id: &str, service_name: &str) -> Self {
        let service_name = service_name.trim();
        Self {
            company_id: Uuid::parse_str(company_id.trim()).ok(),
            owner_id: Uuid::parse_str(owner_id.trim()).ok(),
            service_name: (!service_name.is_empty()).then(|| service_name.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.company_id.is_none() && self.owner_id.is_none() && self.service_name.is_none()
    }

    pub fn matches(&self, validation: &ExpenseValidation) -> bool {
        let expense = validation.expense.as_ref();

        if let Some(company_id) = self.company_id {
            if expense.and_then(|e| e.company_id()) != Some(company_id) {
                return false;
            }
        }
        if let Some(owner_id) = self.owner_id {
            if expense.and_then(|e| e.owner_id()) != Some(owner_id) {
                return false;
            }
        }
        if let Some(term) = &self.service_name {
            let term = term.to_lowercase();
            match expense {
                Some(e) if e.service_name.to_lowercase().contains(&term) => {}
                _ => return false,
            }
        }
        true
    }

    pub fn apply(&self, validations: &[ExpenseValidation]) -> Vec<ExpenseValidation> {
        validations
            .iter()
            .filter(|validation| self.matches(validation))
            .cloned()
            .collect()
    }
}
