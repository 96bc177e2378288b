use askama::Template;
use axum::{extract::State, response::Html};
use rust_decimal::Decimal;

use crate::{
    cache::{QueryFamily, QueryKey},
    error::AppError,
    format::format_brl,
    middleware::{AuthSession, Notice},
    state::AppState,
};

use super::current_user;

struct StatCard {
    label: &'static str,
    value: String,
    highlight: bool,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    user_name: String,
    notice: Option<Notice>,
    cards: Vec<StatCard>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Html<String>, AppError> {
    let signed_in = session.signed_in()?;
    let user = current_user(&state, &session, &signed_in).await?;

    let stats = session.check(
        state
            .cache
            .get_or_fetch(signed_in.user_id, QueryKey::plain(QueryFamily::DashboardStats), || {
                state.api.dashboard_stats(&signed_in.token)
            })
            .await,
    )?;

    let money = |value: Option<Decimal>| format_brl(value.unwrap_or_default());
    let cards = vec![
        StatCard { label: "Gasto total", value: money(stats.total_expenses_value), highlight: false },
        StatCard { label: "Gasto mensal", value: money(stats.monthly_expenses_value), highlight: false },
        StatCard { label: "Ticket médio", value: money(stats.average_expense_value), highlight: false },
        StatCard { label: "Cancelado", value: money(stats.cancelled_expenses_value), highlight: false },
        StatCard {
            label: "Validações pendentes",
            value: stats.pending_validations.to_string(),
            highlight: stats.pending_validations > 0,
        },
        StatCard { label: "Despesas ativas", value: stats.active_expenses.to_string(), highlight: false },
        StatCard { label: "Recorrentes", value: stats.recurring_expenses.to_string(), highlight: false },
        StatCard { label: "Pontuais", value: stats.one_time_expenses.to_string(), highlight: false },
        StatCard { label: "Renovações próximas", value: stats.upcoming_renewals.to_string(), highlight: false },
        StatCard {
            label: "Alertas não lidos",
            value: stats.unread_alerts.to_string(),
            highlight: stats.unread_alerts > 0,
        },
    ];

    let template = DashboardTemplate {
        user_name: user.display_name().to_string(),
        notice: session.take_flash(),
        cards,
    };
    Ok(Html(template.render()?))
}
