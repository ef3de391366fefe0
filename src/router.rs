use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde_json::{Value, json};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::middleware::errors::{handle_panic, route_not_found, translate_errors};
use crate::middleware::rate_limit::rate_limit_general;
use crate::middleware::request_id::{REQUEST_ID_HEADER, capture_request_id};
use crate::modules::auth::init_auth_router;
use crate::modules::categories::init_categories_router;
use crate::modules::posts::init_posts_router;
use crate::modules::users::init_users_router;
use crate::state::AppState;

/// Builds the application.
///
/// Layers, outermost first: request id capture, request logging, error
/// translation, panic catching, CORS, the general rate limit, then routing.
pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest(
            "/api",
            Router::new()
                .nest("/auth", init_auth_router(state.clone()))
                .nest("/users", init_users_router(state.clone()))
                .nest("/posts", init_posts_router(state.clone()))
                .nest("/categories", init_categories_router(state.clone())),
        )
        .fallback(route_not_found)
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_general,
        ))
        .layer(cors_layer(&state))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(state, translate_errors))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(capture_request_id))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            REQUEST_ID_HEADER.clone(),
        ])
        .expose_headers([REQUEST_ID_HEADER.clone(), header::RETRY_AFTER])
        .allow_credentials(true)
}
