use axum::extract::Request;
use axum::middleware::Next;
use axum::routing::{get, patch, put};
use axum::{Router, middleware};

use super::controller::{
    delete_user, get_user, list_users, update_role, update_status, update_user,
};
use crate::middleware::auth::{optional_auth, require_auth};
use crate::middleware::ownership::{OwnershipMode, require_ownership};
use crate::middleware::role::require_admin;
use crate::state::AppState;

pub fn init_users_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/{id}", get(get_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    let own_account = Router::new()
        .route("/{id}", put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_ownership(req, next, "id", OwnershipMode::SelfOnly)
        }))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .route("/", get(list_users))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/role", patch(update_role))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(own_account).merge(admin)
}
