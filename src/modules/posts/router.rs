use axum::extract::{DefaultBodyLimit, Request};
use axum::middleware::Next;
use axum::routing::{get, post, put};
use axum::{Router, middleware};

use super::controller::{
    create_post, delete_post, get_post, list_posts, update_post, upload_cover,
};
use crate::middleware::auth::{optional_auth, require_auth};
use crate::middleware::ownership::{OwnershipMode, require_ownership};
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn init_posts_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_posts))
        .route("/{id}", get(get_post))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    let authoring = Router::new()
        .route("/", post(create_post))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cover_limit = state.config.upload.max_bytes + MULTIPART_OVERHEAD;
    let owned = Router::new()
        .route("/{id}", put(update_post).delete(delete_post))
        .route(
            "/{id}/cover",
            put(upload_cover).layer(DefaultBodyLimit::max(cover_limit)),
        )
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            require_ownership(req, next, "id", OwnershipMode::Deferred)
        }))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    public.merge(authoring).merge(owned)
}
