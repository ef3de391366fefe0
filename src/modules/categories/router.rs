use axum::routing::{get, post, put};
use axum::{Router, middleware};

use super::controller::{
    create_category, delete_category, get_category, list_categories, update_category,
};
use crate::middleware::auth::require_auth;
use crate::middleware::role::require_admin;
use crate::state::AppState;

pub fn init_categories_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_categories))
        .route("/{id}", get(get_category));

    let admin = Router::new()
        .route("/", post(create_category))
        .route("/{id}", put(update_category).delete(delete_category))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(admin)
}
