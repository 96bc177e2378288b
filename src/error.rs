use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use log::{error, warn};

use crate::api::ApiError;
use crate::validations::ExportError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("no signed-in session")]
    LoginRequired,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to render page: {0}")]
    Render(#[from] askama::Error),
    #[error(transparent)]
    Export(#[from] ExportError),
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    status: u16,
    message: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::LoginRequired | AppError::Api(ApiError::Unauthorized) => StatusCode::UNAUTHORIZED,
            AppError::Api(ApiError::Rejected { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Api(ApiError::Transport(err)) if err.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            AppError::Api(_) => StatusCode::BAD_GATEWAY,
            AppError::Render(_) | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Api(ApiError::Rejected { message, .. }) => message.clone(),
            AppError::Api(_) => "O serviço de despesas não respondeu como esperado.".to_string(),
            _ => "Erro interno ao montar a página.".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::UNAUTHORIZED {
            return Redirect::to("/login").into_response();
        }

        if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }

        let page = ErrorTemplate {
            status: status.as_u16(),
            message: self.public_message(),
        };
        match page.render() {
            Ok(html) => (status, Html(html)).into_response(),
            Err(err) => {
                error!("failed to render error page: {}", err);
                (status, page.message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn unauthorized_upstream_redirects_to_login() {
        let response = AppError::Api(ApiError::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/login");
    }

    #[test]
    fn business_rejections_become_bad_gateway_pages() {
        let err = AppError::Api(ApiError::Rejected {
            status: 400,
            message: "Validação já processada".to_string(),
        });
        assert_eq!(err.public_message(), "Validação já processada");
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
