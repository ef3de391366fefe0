use axum::routing::{get, post, put};
use axum::{Router, middleware};

use super::controller::{change_password, forgot_password, login, me, register, reset_password};
use crate::middleware::auth::require_auth;
use crate::middleware::rate_limit::rate_limit_auth;
use crate::state::AppState;

pub fn init_auth_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_auth));

    let protected = Router::new()
        .route("/me", get(me))
        .route("/change-password", put(change_password))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(protected)
}
