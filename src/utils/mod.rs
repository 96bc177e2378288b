pub mod auth;

pub use auth::{read_claims, TokenClaims};
