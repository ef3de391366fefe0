//! Middleware for request processing.
//!
//! # Modules
//!
//! - [`auth`]: `require_auth` / `optional_auth` gates and the identity extractors
//! - [`identity`]: Resolving a bearer token to a live account
//! - [`role`]: Role gates (`require_roles`, `require_admin`)
//! - [`ownership`]: Self-only and deferred ownership checks
//! - [`errors`]: Error envelope translator, router fallback and panic hook
//! - [`request_id`]: `X-Request-Id` capture
//! - [`rate_limit`]: Per-IP request quotas
//!
//! # Authorization Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. `require_auth` verifies the token and loads the account fresh from storage
//! 3. Role and ownership gates check the attached `CurrentUser`
//! 4. The handler runs. Any `AppError` raised on the way is rendered by
//!    `translate_errors`
//!
//! Gates are attached with `route_layer`. The layer added last runs first, so
//! `require_auth` is always added after the gates that depend on it:
//!
//! ```ignore
//! Router::new()
//!     .route("/", get(list_users))
//!     .route_layer(middleware::from_fn(require_admin))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
//! ```

pub mod auth;
pub mod errors;
pub mod identity;
pub mod ownership;
pub mod rate_limit;
pub mod request_id;
pub mod role;
