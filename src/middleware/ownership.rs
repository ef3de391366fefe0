//! Resource ownership checks.
//!
//! Admins bypass every ownership rule. For everyone else:
//!
//! - [`OwnershipMode::SelfOnly`] compares a route parameter holding a user id
//!   with the caller's id, for routes like `/api/users/{id}`
//! - [`OwnershipMode::Deferred`] lets the request through; the handler loads
//!   the resource and calls [`ensure_owner`] against its owner field

use axum::extract::{FromRequestParts, RawPathParams, Request};
use axum::middleware::Next;
use axum::response::Response;
use inkwell_core::AppError;
use inkwell_models::{User, UserId};

use crate::middleware::auth::CurrentUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipMode {
    SelfOnly,
    Deferred,
}

/// Pure ownership decision for a path parameter value.
pub fn check_ownership(
    user: &User,
    param: Option<&str>,
    mode: OwnershipMode,
) -> Result<(), AppError> {
    if user.is_admin() || mode == OwnershipMode::Deferred {
        return Ok(());
    }

    // A missing or malformed id can never be the caller's own.
    match param.and_then(|value| value.parse::<UserId>().ok()) {
        Some(owner) if owner == user.id => Ok(()),
        _ => Err(AppError::forbidden("You can only access your own resources")),
    }
}

/// Handler-side check for [`OwnershipMode::Deferred`] routes.
pub fn ensure_owner(user: &User, owner: UserId, message: &str) -> Result<(), AppError> {
    if user.is_admin() || user.id == owner {
        Ok(())
    } else {
        Err(AppError::forbidden(message))
    }
}

/// Ownership gate. `param` names the route parameter carrying the owner id.
///
/// ```rust,ignore
/// .route_layer(middleware::from_fn(|req, next| {
///     require_ownership(req, next, "id", OwnershipMode::SelfOnly)
/// }))
/// ```
pub async fn require_ownership(
    req: Request,
    next: Next,
    param: &'static str,
    mode: OwnershipMode,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let user = parts
        .extensions
        .get::<CurrentUser>()
        .cloned()
        .ok_or(AppError::Unauthenticated)?;

    let params = RawPathParams::from_request_parts(&mut parts, &())
        .await
        .map_err(AppError::internal)?;
    let value = params
        .iter()
        .find_map(|(name, value)| (name == param).then_some(value));

    check_ownership(&user, value, mode)?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}
