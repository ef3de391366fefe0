//! Turns a bearer token into a live account.

use inkwell_core::AppError;
use inkwell_models::{User, UserId};
use tracing::instrument;

use crate::state::AppState;

/// Verifies `token` and loads the account it names.
///
/// The account is read fresh from storage on every call, so deactivation
/// and role changes take effect on the next request.
///
/// # Errors
///
/// - `TokenInvalid` / `TokenExpired` when verification fails
/// - `UserNotFound` when the account no longer exists
/// - `AccountDeactivated` when the account is inactive
/// - storage failures as they are (`DatabaseUnavailable` or `Unexpected`)
#[instrument(skip_all)]
pub async fn resolve_identity(state: &AppState, token: &str) -> Result<User, AppError> {
    let claims = state.tokens.verify(token)?;

    let user = state
        .storage
        .users
        .find_by_id(UserId::from(claims.id))
        .await?
        .ok_or(AppError::UserNotFound)?;

    if !user.is_active {
        return Err(AppError::AccountDeactivated);
    }

    Ok(user)
}
