use std::collections::HashSet;
use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Form, Path, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::ApiError,
    cache::{QueryFamily, QueryKey},
    error::AppError,
    filters,
    format::{format_brl, format_date, format_money, month_label},
    middleware::{AuthSession, Notice, SignedIn},
    models::{Company, Currency, ExpenseValidation, User, ValidationStatus},
    state::AppState,
    validations::{
        build_csv, csv_filename, month_options, total_brl, ActionError, FetchPlan, Month,
        RejectFlow, StatusTab, ValidationFilters, CSV_CONTENT_TYPE,
    },
};

use super::{current_user, optional};

/// Query string of the board. Everything is optional; bad values fall back
/// to the defaults instead of failing the request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BoardParams {
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub tab: Option<String>,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub reject: Option<String>,
    #[serde(default)]
    pub charged: Option<String>,
}

impl BoardParams {
    pub fn month(&self, today: NaiveDate) -> Month {
        self.month
            .as_deref()
            .and_then(|month| month.trim().parse().ok())
            .unwrap_or_else(|| Month::containing(today))
    }

    pub fn tab(&self) -> StatusTab {
        self.tab.as_deref().map(StatusTab::parse).unwrap_or_default()
    }

    pub fn filters(&self) -> ValidationFilters {
        ValidationFilters::from_form(&self.company_id, &self.owner_id, &self.service_name)
    }

    pub fn reject_flow(&self) -> RejectFlow {
        let target = self.reject.as_deref().and_then(|id| Uuid::parse_str(id.trim()).ok());
        RejectFlow::from_params(target, self.charged.as_deref().and_then(parse_flag))
    }

    /// Query string reproducing the board view, dialogs closed.
    pub fn board_query(&self, month: Month, tab: StatusTab) -> String {
        let filters = self.filters();
        let mut pairs = vec![("month", month.to_string()), ("tab", tab.to_string())];
        if let Some(company_id) = filters.company_id {
            pairs.push(("company_id", company_id.to_string()));
        }
        if let Some(owner_id) = filters.owner_id {
            pairs.push(("owner_id", owner_id.to_string()));
        }
        if let Some(service_name) = filters.service_name {
            pairs.push(("service_name", service_name));
        }
        pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" | "sim" => Some(true),
        "false" | "0" | "nao" | "não" => Some(false),
        _ => None,
    }
}

/// Hidden fields posted back by the approve and reject forms so the board can
/// be reloaded as the user saw it.
#[derive(Debug, Default, Deserialize)]
pub struct ActionForm {
    #[serde(default)]
    month: Option<String>,
    #[serde(default)]
    tab: Option<String>,
    #[serde(default)]
    company_id: String,
    #[serde(default)]
    owner_id: String,
    #[serde(default)]
    service_name: String,
    #[serde(default)]
    charged_this_month: Option<String>,
}

impl ActionForm {
    fn board(&self) -> BoardParams {
        BoardParams {
            month: self.month.clone(),
            tab: self.tab.clone(),
            company_id: self.company_id.clone(),
            owner_id: self.owner_id.clone(),
            service_name: self.service_name.clone(),
            reject: None,
            charged: None,
        }
    }
}

/// Rows of one board view, after filtering.
struct Board {
    month: Month,
    tab: StatusTab,
    plan: FetchPlan,
    fetched: usize,
    rows: Vec<ExpenseValidation>,
}

async fn load_board(
    state: &AppState,
    session: &AuthSession,
    signed_in: &SignedIn,
    params: &BoardParams,
) -> Result<Board, AppError> {
    let today = state.today();
    let month = params.month(today);
    let tab = params.tab();
    let plan = FetchPlan::select(month, tab, today);

    let fetched = session.check(
        state
            .fetcher()
            .load(signed_in.user_id, &signed_in.token, &plan)
            .await,
    )?;

    Ok(Board {
        month,
        tab,
        plan,
        fetched: fetched.len(),
        rows: params.filters().apply(&fetched),
    })
}

struct RowView {
    action_id: String,
    code: String,
    service_name: String,
    category: String,
    company: String,
    department: String,
    owner: String,
    value: String,
    status_label: &'static str,
    status_class: &'static str,
    month_label: String,
    renewal: String,
    validator: String,
    validated_on: String,
    overdue: bool,
    rejected: bool,
    can_act: bool,
    in_flight: bool,
}

impl RowView {
    fn new(validation: &ExpenseValidation, today: NaiveDate, state: &AppState) -> Self {
        let expense = validation.expense.as_ref();
        let name = |value: Option<&String>| value.cloned().unwrap_or_default();
        let overdue = validation.is_overdue_on(today);
        let (status_label, status_class) = if validation.is_predicted {
            ("Prevista", "predicted")
        } else if overdue {
            ("Atrasada", "overdue")
        } else {
            (validation.status.label(), validation.status.as_str())
        };
        let action_id = validation.action_id();

        Self {
            action_id: action_id.map(|id| id.to_string()).unwrap_or_default(),
            code: name(expense.map(|e| &e.code)),
            service_name: name(expense.map(|e| &e.service_name)),
            category: name(expense.and_then(|e| e.category.as_ref()).map(|c| &c.name)),
            company: name(expense.and_then(|e| e.company.as_ref()).map(|c| &c.name)),
            department: name(expense.and_then(|e| e.department.as_ref()).map(|d| &d.name)),
            owner: name(expense.and_then(|e| e.owner.as_ref()).map(|o| &o.name)),
            value: expense
                .map(|e| {
                    let currency = e.currency.clone().unwrap_or(Currency::Brl);
                    format_money(e.value.unwrap_or(Decimal::ZERO), &currency)
                })
                .unwrap_or_default(),
            status_label,
            status_class,
            month_label: month_label(Month::containing(validation.validation_month)),
            renewal: expense
                .and_then(|e| e.renewal_date)
                .map(format_date)
                .unwrap_or_default(),
            validator: name(validation.validator.as_ref().map(|v| &v.name)),
            validated_on: validation.validated_on.map(format_date).unwrap_or_default(),
            overdue,
            rejected: validation.status == ValidationStatus::Rejected,
            can_act: action_id.is_some(),
            in_flight: action_id.is_some_and(|id| state.in_flight.is_in_flight(id)),
        }
    }
}

struct SelectOption {
    value: String,
    label: String,
    selected: bool,
}

struct TabView {
    label: &'static str,
    query: String,
    active: bool,
}

/// Dialog state of the reject flow. `confirming` is false while the
/// charged-this-month question is still open.
struct RejectDialog {
    id: String,
    service_name: String,
    confirming: bool,
    charged: bool,
}

#[derive(Template)]
#[template(path = "validations.html")]
struct BoardTemplate {
    user_name: String,
    notice: Option<Notice>,
    month: String,
    month_title: String,
    tab: String,
    predicted: bool,
    months: Vec<SelectOption>,
    tabs: Vec<TabView>,
    companies: Vec<SelectOption>,
    owners: Vec<SelectOption>,
    company_id: String,
    owner_id: String,
    service_name: String,
    has_filters: bool,
    board_query: String,
    rows: Vec<RowView>,
    fetched: usize,
    total: String,
    empty_title: String,
    empty_detail: String,
    dialog: Option<RejectDialog>,
}

pub async fn board(
    State(state): State<AppState>,
    session: AuthSession,
    Query(params): Query<BoardParams>,
) -> Result<Html<String>, AppError> {
    let signed_in = session.signed_in()?;
    let user = current_user(&state, &session, &signed_in).await?;
    let board = load_board(&state, &session, &signed_in, &params).await?;
    let today = state.today();
    let filters = params.filters();

    let companies = company_options(&state, &session, &signed_in, &user, filters.company_id).await?;
    let owners = owner_options(&state, &session, &signed_in, &user, filters.owner_id).await?;

    let board_query = params.board_query(board.month, board.tab);
    let dialog = reject_dialog(params.reject_flow(), &board.rows);
    let (empty_title, empty_detail) = empty_state(&board, !filters.is_empty());

    let template = BoardTemplate {
        user_name: user.display_name().to_string(),
        notice: session.take_flash(),
        month: board.month.to_string(),
        month_title: month_label(board.month),
        tab: board.tab.to_string(),
        predicted: board.plan.is_predicted(),
        months: month_select(today, board.month),
        tabs: StatusTab::ALL
            .into_iter()
            .map(|tab| TabView {
                label: tab.label(),
                query: params.board_query(board.month, tab),
                active: tab == board.tab,
            })
            .collect(),
        companies,
        owners,
        company_id: filters.company_id.map(|id| id.to_string()).unwrap_or_default(),
        owner_id: filters.owner_id.map(|id| id.to_string()).unwrap_or_default(),
        service_name: filters.service_name.clone().unwrap_or_default(),
        has_filters: !filters.is_empty(),
        board_query,
        total: format_brl(total_brl(&board.rows)),
        rows: board.rows.iter().map(|row| RowView::new(row, today, &state)).collect(),
        fetched: board.fetched,
        empty_title,
        empty_detail,
        dialog,
    };
    Ok(Html(template.render()?))
}

fn month_select(today: NaiveDate, selected: Month) -> Vec<SelectOption> {
    let mut options: Vec<SelectOption> = month_options(today)
        .into_iter()
        .map(|option| SelectOption {
            value: option.month.to_string(),
            label: option.label,
            selected: option.month == selected,
        })
        .collect();

    if !options.iter().any(|option| option.selected) {
        let mut label = month_label(selected);
        if selected.is_future(today) {
            label.push_str(" (previsto)");
        }
        options.insert(0, SelectOption { value: selected.to_string(), label, selected: true });
    }
    options
}

async fn company_options(
    state: &AppState,
    session: &AuthSession,
    signed_in: &SignedIn,
    user: &User,
    selected: Option<Uuid>,
) -> Result<Vec<SelectOption>, AppError> {
    let fetched = state
        .cache
        .get_or_fetch(signed_in.user_id, QueryKey::plain(QueryFamily::Companies), || {
            state.api.companies(&signed_in.token)
        })
        .await;
    let companies: Arc<Vec<Company>> = optional(session, "companies", fetched)?.unwrap_or_default();

    let own: HashSet<Uuid> = user.companies.iter().map(|company| company.id).collect();
    let restrict = user.is_leader() && !own.is_empty();

    Ok(companies
        .iter()
        .filter(|company| !restrict || own.contains(&company.id))
        .map(|company| SelectOption {
            value: company.id.to_string(),
            label: company.name.clone(),
            selected: selected == Some(company.id),
        })
        .collect())
}

/// Leaders only get themselves. Everyone else gets the active users, once
/// per id.
async fn owner_options(
    state: &AppState,
    session: &AuthSession,
    signed_in: &SignedIn,
    user: &User,
    selected: Option<Uuid>,
) -> Result<Vec<SelectOption>, AppError> {
    let option = |candidate: &User| SelectOption {
        value: candidate.id.to_string(),
        label: candidate.display_name().to_string(),
        selected: selected == Some(candidate.id),
    };

    if user.is_leader() {
        return Ok(vec![option(user)]);
    }

    let fetched = state
        .cache
        .get_or_fetch(signed_in.user_id, QueryKey::plain(QueryFamily::Users), || {
            state.api.users(&signed_in.token)
        })
        .await;
    let users: Arc<Vec<User>> = optional(session, "users", fetched)?.unwrap_or_default();

    let mut seen = HashSet::new();
    Ok(users
        .iter()
        .filter(|candidate| candidate.is_active && seen.insert(candidate.id))
        .map(option)
        .collect())
}

/// The dialog only opens for a row the user can act on in the current view.
fn reject_dialog(flow: RejectFlow, rows: &[ExpenseValidation]) -> Option<RejectDialog> {
    let id = flow.target()?;
    let row = rows.iter().find(|row| row.action_id() == Some(id))?;
    let service_name = row
        .expense
        .as_ref()
        .map(|expense| expense.service_name.clone())
        .unwrap_or_default();

    match flow {
        RejectFlow::Idle => None,
        RejectFlow::AskingChargedStatus(_) => Some(RejectDialog {
            id: id.to_string(),
            service_name,
            confirming: false,
            charged: false,
        }),
        RejectFlow::ConfirmingReject { charged_this_month, .. } => Some(RejectDialog {
            id: id.to_string(),
            service_name,
            confirming: true,
            charged: charged_this_month,
        }),
    }
}

fn empty_state(board: &Board, filtered: bool) -> (String, String) {
    let month = month_label(board.month);
    let title = if board.plan.is_predicted() {
        "Nenhuma validação prevista"
    } else {
        match board.tab {
            StatusTab::Pending => "Nenhuma validação pendente",
            StatusTab::Approved => "Nenhuma validação aprovada",
            StatusTab::Rejected => "Nenhuma validação rejeitada",
            StatusTab::All => "Nenhuma validação encontrada",
        }
    };

    let detail = if filtered {
        "Nenhuma validação encontrada com os filtros aplicados. Tente ajustar os filtros.".to_string()
    } else if board.plan.is_predicted() {
        format!("Não há despesas recorrentes ativas que gerarão validações em {month}.")
    } else {
        match board.tab {
            StatusTab::Pending => format!("Todas as despesas de {month} foram validadas."),
            StatusTab::Approved => format!("Não há validações aprovadas para {month}."),
            StatusTab::Rejected => format!("Não há validações rejeitadas para {month}."),
            StatusTab::All => format!("Não há validações para {month}."),
        }
    };
    (title.to_string(), detail)
}

fn board_redirect(params: &BoardParams, today: NaiveDate, extra: Option<String>) -> Redirect {
    let mut query = params.board_query(params.month(today), params.tab());
    if let Some(extra) = extra {
        query.push('&');
        query.push_str(&extra);
    }
    Redirect::to(&format!("/validations?{query}"))
}

/// Turns a failed decision into a notification. Only an expired session
/// escapes as an error.
fn failure_notice(session: &AuthSession, title: &str, err: ActionError) -> Result<Notice, AppError> {
    let detail = match err {
        ActionError::NotActionable => "a validação é prevista ou já foi processada.".to_string(),
        ActionError::InFlight => "outra decisão para esta validação ainda está em andamento.".to_string(),
        ActionError::Api(ApiError::Rejected { message, .. }) => message,
        ActionError::Api(err) if err.is_unauthorized() => return session.check(Err(err)),
        ActionError::Api(_) => "não foi possível concluir a operação.".to_string(),
    };
    Ok(Notice::error(format!("{title}: {detail}")))
}

/// Board lookup ahead of a decision. An upstream failure comes back as the
/// notice to flash, so the user lands on the board instead of an error page.
async fn load_action_board(
    state: &AppState,
    session: &AuthSession,
    signed_in: &SignedIn,
    params: &BoardParams,
    title: &str,
) -> Result<Result<Board, Notice>, AppError> {
    match load_board(state, session, signed_in, params).await {
        Ok(board) => Ok(Ok(board)),
        Err(AppError::Api(err)) => failure_notice(session, title, ActionError::Api(err)).map(Err),
        Err(err) => Err(err),
    }
}

const NOT_ON_BOARD: &str = "Validação não encontrada nesta visão ou já processada.";

pub async fn approve(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    Form(form): Form<ActionForm>,
) -> Result<Redirect, AppError> {
    let signed_in = session.signed_in()?;
    let params = form.board();
    let title = "Erro ao aprovar";

    let notice = match load_action_board(&state, &session, &signed_in, &params, title).await? {
        Err(notice) => notice,
        Ok(board) => match board.rows.iter().find(|row| row.id == Some(id)) {
            None => Notice::error(NOT_ON_BOARD),
            Some(target) => match state.dispatcher().approve(&signed_in.token, target).await {
                Ok(_) => Notice::success("Despesa aprovada! A validação foi registrada com sucesso."),
                Err(err) => failure_notice(&session, title, err)?,
            },
        },
    };

    session.flash(notice);
    Ok(board_redirect(&params, state.today(), None))
}

pub async fn reject(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    Form(form): Form<ActionForm>,
) -> Result<Redirect, AppError> {
    let signed_in = session.signed_in()?;
    let params = form.board();
    let charged = form.charged_this_month.as_deref().and_then(parse_flag);

    // Without an answer to the charged question the flow is not confirmed yet,
    // so send the user back to the question.
    let Some((target_id, request)) = RejectFlow::from_params(Some(id), charged).confirmed() else {
        return Ok(board_redirect(&params, state.today(), Some(format!("reject={id}"))));
    };

    let title = "Erro ao rejeitar";
    let notice = match load_action_board(&state, &session, &signed_in, &params, title).await? {
        Err(notice) => notice,
        Ok(board) => match board.rows.iter().find(|row| row.id == Some(target_id)) {
            None => Notice::error(NOT_ON_BOARD),
            Some(target) => match state.dispatcher().reject(&signed_in.token, target, request).await {
                Ok(_) => Notice::success("Despesa cancelada. A validação foi registrada e a despesa foi cancelada."),
                Err(err) => failure_notice(&session, title, err)?,
            },
        },
    };

    session.flash(notice);
    Ok(board_redirect(&params, state.today(), None))
}

/// Downloads the rows of the current view, filters applied.
pub async fn export_csv(
    State(state): State<AppState>,
    session: AuthSession,
    Query(params): Query<BoardParams>,
) -> Result<Response, AppError> {
    let signed_in = session.signed_in()?;
    let board = load_board(&state, &session, &signed_in, &params).await?;

    let body = build_csv(&board.rows)?;
    let disposition = format!("attachment; filename=\"{}\"", csv_filename(board.month, board.tab));
    Ok((
        [(CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()), (CONTENT_DISPOSITION, disposition)],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validations::filter::tests::{row, COMPANY_A, OWNER_X};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn malformed_months_fall_back_to_the_current_one() {
        let today = day(2024, 6, 15);
        for month in [None, Some("junho"), Some("2024-13"), Some("")] {
            let params = BoardParams { month: month.map(str::to_string), ..BoardParams::default() };
            assert_eq!(params.month(today).to_string(), "2024-06");
        }
        let params = BoardParams { month: Some("2025-01".to_string()), ..BoardParams::default() };
        assert_eq!(params.month(today).to_string(), "2025-01");
    }

    #[test]
    fn board_query_keeps_filters_and_drops_dialog_state() {
        let params = BoardParams {
            company_id: COMPANY_A.to_string(),
            owner_id: "all".to_string(),
            service_name: "Google Workspace".to_string(),
            reject: Some(Uuid::new_v4().to_string()),
            charged: Some("true".to_string()),
            ..BoardParams::default()
        };
        let month: Month = "2024-06".parse().expect("valid month");
        assert_eq!(
            params.board_query(month, StatusTab::Approved),
            format!("month=2024-06&tab=approved&company_id={COMPANY_A}&service_name=Google%20Workspace")
        );
    }

    #[test]
    fn reject_parameters_drive_the_flow() {
        let id = Uuid::new_v4();
        let asking = BoardParams { reject: Some(id.to_string()), ..BoardParams::default() };
        assert_eq!(asking.reject_flow(), RejectFlow::AskingChargedStatus(id));

        let confirming = BoardParams {
            reject: Some(id.to_string()),
            charged: Some("false".to_string()),
            ..BoardParams::default()
        };
        assert_eq!(
            confirming.reject_flow(),
            RejectFlow::ConfirmingReject { id, charged_this_month: false }
        );

        let garbage = BoardParams { reject: Some("nope".to_string()), ..BoardParams::default() };
        assert_eq!(garbage.reject_flow(), RejectFlow::Idle);
    }

    #[test]
    fn dialog_needs_an_actionable_row_in_view() {
        let mut pending = row(COMPANY_A, OWNER_X, "Slack");
        pending.status = ValidationStatus::Pending;
        let id = pending.action_id().expect("pending row has an id");

        let dialog = reject_dialog(RejectFlow::AskingChargedStatus(id), &[pending.clone()])
            .expect("dialog opens");
        assert!(!dialog.confirming);
        assert_eq!(dialog.service_name, "Slack");

        assert!(reject_dialog(RejectFlow::AskingChargedStatus(Uuid::new_v4()), &[pending.clone()]).is_none());

        let mut predicted = pending;
        predicted.is_predicted = true;
        assert!(reject_dialog(RejectFlow::AskingChargedStatus(id), &[predicted]).is_none());
    }

    #[test]
    fn out_of_range_months_are_still_selectable() {
        let today = day(2024, 6, 15);
        let old: Month = "2019-01".parse().expect("valid month");
        let options = month_select(today, old);
        assert_eq!(options[0].value, "2019-01");
        assert!(options[0].selected);
        assert_eq!(options.iter().filter(|option| option.selected).count(), 1);
    }
}
