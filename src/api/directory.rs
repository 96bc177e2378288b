use crate::models::{AuthResponse, Company, LoginRequest, User};

use super::client::NO_QUERY;
use super::{ApiClient, ApiError};

impl ApiClient {
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post(None, "/auth/login", credentials).await
    }

    pub async fn current_user(&self, token: &str) -> Result<User, ApiError> {
        self.get(token, "/users/me", NO_QUERY).await
    }

    /// Companies visible to the signed-in user.
    pub async fn companies(&self, token: &str) -> Result<Vec<Company>, ApiError> {
        self.get(token, "/companies/me", NO_QUERY).await
    }

    pub async fn users(&self, token: &str) -> Result<Vec<User>, ApiError> {
        self.get(token, "/users", NO_QUERY).await
    }
}
