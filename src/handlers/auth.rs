use askama::Template;
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use log::{info, warn};
use serde::Deserialize;

use crate::{
    api::ApiError,
    error::AppError,
    middleware::AuthSession,
    models::LoginRequest,
    state::AppState,
};

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    error: String,
    email: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

pub async fn login_page(session: AuthSession) -> Result<Response, AppError> {
    if session.signed_in().is_ok() {
        return Ok(Redirect::to("/dashboard").into_response());
    }
    let template = LoginTemplate {
        error: String::new(),
        email: String::new(),
    };
    Ok(Html(template.render()?).into_response())
}

pub async fn login(
    State(state): State<AppState>,
    session: AuthSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let credentials = LoginRequest {
        email: form.email.trim().to_string(),
        password: form.password,
    };

    match state.api.login(&credentials).await {
        Ok(auth) => {
            session.login(auth.access_token);
            info!("{} signed in", credentials.email);
            Ok(Redirect::to("/dashboard").into_response())
        }
        Err(err) => {
            let (status, message) = match err {
                ApiError::Unauthorized | ApiError::Rejected { .. } => {
                    (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos")
                }
                other => {
                    warn!("login request failed: {}", other);
                    (StatusCode::BAD_GATEWAY, "Não foi possível conectar ao servidor")
                }
            };
            let template = LoginTemplate {
                error: message.to_string(),
                email: credentials.email,
            };
            Ok((status, Html(template.render()?)).into_response())
        }
    }
}

pub async fn logout(State(state): State<AppState>, session: AuthSession) -> Redirect {
    if let Ok(signed_in) = session.signed_in() {
        state.cache.forget_scope(signed_in.user_id).await;
    }
    session.logout();
    Redirect::to("/login")
}
