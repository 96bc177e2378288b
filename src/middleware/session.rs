use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{api::ApiError, error::AppError, state::AppState, utils::read_claims};

pub const TOKEN_COOKIE: &str = "nitro_token";
pub const FLASH_COOKIE: &str = "nitro_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// One-shot notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, message: message.into() }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// Token and user id of the browser session making the request.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub token: String,
    pub user_id: Uuid,
}

/// Cookie-backed session of the current browser.
pub struct AuthSession {
    cookies: Cookies,
    secure: bool,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = <Cookies as FromRequestParts<AppState>>::Rejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let cookies = Cookies::from_request_parts(parts, state).await?;
        Ok(Self {
            cookies,
            secure: state.config.secure_cookies,
        })
    }
}

impl AuthSession {
    /// The session's token, provided it is still readable and unexpired. A
    /// stale token is dropped on the way.
    pub fn signed_in(&self) -> Result<SignedIn, AppError> {
        let token = self
            .cookies
            .get(TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or(AppError::LoginRequired)?;

        let user_id = read_claims(&token).ok().and_then(|claims| claims.user_id());
        match user_id {
            Some(user_id) => Ok(SignedIn { token, user_id }),
            None => {
                self.logout();
                Err(AppError::LoginRequired)
            }
        }
    }

    /// Stores the upstream token. The cookie lives as long as the token does.
    pub fn login(&self, token: String) {
        let lifetime = read_claims(&token)
            .map(|claims| claims.exp - Utc::now().timestamp())
            .unwrap_or_default();
        let mut cookie = Cookie::build((TOKEN_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(self.secure);
        if lifetime > 0 {
            cookie = cookie.max_age(time::Duration::seconds(lifetime));
        }
        self.cookies.add(cookie.build());
    }

    pub fn logout(&self) {
        self.cookies.remove(Cookie::build((TOKEN_COOKIE, "")).path("/").build());
    }

    /// Passes an upstream result through, ending the session when the
    /// upstream no longer accepts its token.
    pub fn check<T>(&self, result: Result<T, ApiError>) -> Result<T, AppError> {
        result.map_err(|err| {
            if err.is_unauthorized() {
                self.logout();
            }
            AppError::Api(err)
        })
    }

    pub fn flash(&self, notice: Notice) {
        let Ok(json) = serde_json::to_string(&notice) else {
            return;
        };
        let cookie = Cookie::build((FLASH_COOKIE, urlencoding::encode(&json).into_owned()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .build();
        self.cookies.add(cookie);
    }

    pub fn take_flash(&self) -> Option<Notice> {
        let raw = self.cookies.get(FLASH_COOKIE)?;
        self.cookies.remove(Cookie::build((FLASH_COOKIE, "")).path("/").build());
        let json = urlencoding::decode(raw.value()).ok()?;
        serde_json::from_str(&json).ok()
    }
}
