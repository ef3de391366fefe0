//! Authentication gates and identity extractors.
//!
//! The gates run as `route_layer` middleware:
//!
//! - [`require_auth`] halts with 401/403 unless the request carries a valid
//!   token for an active account
//! - [`optional_auth`] attaches the identity when it can and lets the request
//!   through anonymously otherwise
//!
//! Handlers read the attached identity with the [`CurrentUser`] or
//! [`MaybeUser`] extractors.

use std::convert::Infallible;
use std::ops::Deref;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use inkwell_auth::extract_bearer;
use inkwell_core::AppError;
use inkwell_models::{User, UserId};
use tracing::debug;

use crate::middleware::identity::resolve_identity;
use crate::state::AppState;

/// The resolved account behind the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Arc<User>);

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

/// Id of the authenticated caller, left on the response for the error
/// translator to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub UserId);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}

/// The identity if one was attached, `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<CurrentUser>().cloned()))
    }
}

/// Requires a bearer token that resolves to an active account.
///
/// # Errors
///
/// - 401 `Access denied` when no token is sent
/// - 401 `Invalid token` / `Token expired` / `User not found`
/// - 403 `Account deactivated`
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer(req.headers()).ok_or(AppError::Unauthenticated)?;
    let user = resolve_identity(&state, token).await?;

    let caller = CallerId(user.id);
    req.extensions_mut().insert(CurrentUser(Arc::new(user)));

    let mut response = next.run(req).await;
    response.extensions_mut().insert(caller);
    Ok(response)
}

/// Attaches the identity when the token resolves. Any failure is logged and
/// the request continues without one.
pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let resolved = match extract_bearer(req.headers()) {
        Some(token) => Some(resolve_identity(&state, token).await),
        None => None,
    };

    let mut caller = None;
    match resolved {
        Some(Ok(user)) => {
            caller = Some(CallerId(user.id));
            req.extensions_mut().insert(CurrentUser(Arc::new(user)));
        }
        Some(Err(err)) => {
            debug!(error = %err, "Optional authentication failed, continuing anonymously");
        }
        None => {}
    }

    let mut response = next.run(req).await;
    if let Some(caller) = caller {
        response.extensions_mut().insert(caller);
    }
    response
}
