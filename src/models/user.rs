use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::expense::Company;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    FinanceAdmin,
    SystemAdmin,
    Leader,
    User,
}

/// Upstream user. The embedded "basic" shape only carries id, name and email.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub companies: Vec<Company>,
}

impl User {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }

    pub fn is_leader(&self) -> bool {
        self.role == Some(UserRole::Leader)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
}

fn active_by_default() -> bool {
    true
}
