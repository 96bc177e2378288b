use askama::Template;
use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;

use crate::{
    api::ExpenseQuery,
    cache::{QueryFamily, QueryKey},
    error::AppError,
    filters,
    format::{format_brl, format_date, format_money},
    middleware::{AuthSession, Notice},
    models::{Currency, Expense, ExpenseStatus},
    state::AppState,
    validations::expense_value_brl,
};

use super::current_user;

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseParams {
    #[serde(default)]
    status: String,
    #[serde(default)]
    service_name: String,
}

impl ExpenseParams {
    fn query(&self) -> ExpenseQuery {
        let service_name = self.service_name.trim();
        ExpenseQuery {
            status: ExpenseStatus::parse(self.status.trim()),
            service_name: (!service_name.is_empty()).then(|| service_name.to_string()),
        }
    }
}

struct ExpenseRow {
    code: String,
    service_name: String,
    company: String,
    owner: String,
    value: String,
    value_brl: String,
    periodicity: String,
    status: String,
    renewal: String,
}

impl From<&Expense> for ExpenseRow {
    fn from(expense: &Expense) -> Self {
        let currency = expense.currency.clone().unwrap_or(Currency::Brl);
        Self {
            code: expense.code.clone(),
            service_name: expense.service_name.clone(),
            company: expense.company.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
            owner: expense.owner.as_ref().map(|o| o.name.clone()).unwrap_or_default(),
            value: expense.value.map(|v| format_money(v, &currency)).unwrap_or_default(),
            value_brl: expense_value_brl(expense).map(format_brl).unwrap_or_default(),
            periodicity: expense.periodicity.map(|p| p.label().to_string()).unwrap_or_default(),
            status: expense.status.map(|s| s.label().to_string()).unwrap_or_default(),
            renewal: expense.renewal_date.map(format_date).unwrap_or_default(),
        }
    }
}

struct StatusOption {
    value: &'static str,
    label: &'static str,
    selected: bool,
}

#[derive(Template)]
#[template(path = "expenses.html")]
struct ExpensesTemplate {
    user_name: String,
    notice: Option<Notice>,
    statuses: Vec<StatusOption>,
    service_name: String,
    expenses: Vec<ExpenseRow>,
}

pub async fn expenses_list(
    State(state): State<AppState>,
    session: AuthSession,
    Query(params): Query<ExpenseParams>,
) -> Result<Html<String>, AppError> {
    let signed_in = session.signed_in()?;
    let user = current_user(&state, &session, &signed_in).await?;

    let query = params.query();
    let key = QueryKey::new(
        QueryFamily::Expenses,
        format!(
            "{}|{}",
            query.status.map(ExpenseStatus::as_str).unwrap_or_default(),
            query.service_name.as_deref().unwrap_or_default()
        ),
    );
    let expenses = session.check(
        state
            .cache
            .get_or_fetch(signed_in.user_id, key, || state.api.expenses(&signed_in.token, &query))
            .await,
    )?;

    let statuses = ExpenseStatus::ALL
        .into_iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.label(),
            selected: query.status == Some(status),
        })
        .collect();

    let template = ExpensesTemplate {
        user_name: user.display_name().to_string(),
        notice: session.take_flash(),
        statuses,
        service_name: params.service_name.trim().to_string(),
        expenses: expenses.iter().map(ExpenseRow::from).collect(),
    };
    Ok(Html(template.render()?))
}
