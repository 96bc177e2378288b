pub mod auth;
pub mod dashboard;
pub mod expenses;
pub mod validations;

use std::sync::Arc;

use log::warn;

use crate::{
    api::ApiError,
    cache::{Cacheable, QueryFamily, QueryKey},
    error::AppError,
    middleware::{AuthSession, SignedIn},
    models::User,
    state::AppState,
};

/// The signed-in user's profile, cached per session.
pub(crate) async fn current_user(
    state: &AppState,
    session: &AuthSession,
    signed_in: &SignedIn,
) -> Result<Arc<User>, AppError> {
    let result = state
        .cache
        .get_or_fetch(signed_in.user_id, QueryKey::plain(QueryFamily::CurrentUser), || {
            state.api.current_user(&signed_in.token)
        })
        .await;
    session.check(result)
}

/// Data a page can render without, such as dropdown options. Upstream refusals
/// are logged and yield `None`; an expired session still ends the request.
pub(crate) fn optional<T: Cacheable>(
    session: &AuthSession,
    what: &str,
    result: Result<Arc<T>, ApiError>,
) -> Result<Option<Arc<T>>, AppError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_unauthorized() => session.check(Err(err)),
        Err(err) => {
            warn!("could not load {}: {}", what, err);
            Ok(None)
        }
    }
}
