//! Role-based authorization.
//!
//! These gates expect [`require_auth`](crate::middleware::auth::require_auth)
//! to have attached a [`CurrentUser`] already. Without one they answer 401.
//!
//! ```rust,ignore
//! let admin_routes = Router::new()
//!     .route("/", get(list_users))
//!     .route_layer(middleware::from_fn(require_admin))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
//! ```

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use inkwell_auth::Role;
use inkwell_core::AppError;
use inkwell_models::User;

use crate::middleware::auth::CurrentUser;

/// Checks that `user` holds one of `allowed`.
pub fn check_any_role(user: &User, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }

    let required = allowed
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    Err(
        AppError::operational(StatusCode::FORBIDDEN, "Insufficient permissions")
            .with_details(format!("Required role: {required}")),
    )
}

pub async fn require_roles(req: Request, next: Next, allowed: &[Role]) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::Unauthenticated)?;

    check_any_role(user, allowed)?;
    Ok(next.run(req).await)
}

/// Admin-only gate for `middleware::from_fn`.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    require_roles(req, next, &[Role::Admin]).await
}
