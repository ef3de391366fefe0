mod common;

use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use common::{TestApp, assert_envelope, spawn_app};
use inkwell::inkwell_core::AppError;
use inkwell::middleware::auth::require_auth;
use inkwell::middleware::errors::translate_errors;
use inkwell::middleware::ownership::{OwnershipMode, require_ownership};
use inkwell::middleware::role::require_admin;

async fn self_only(req: Request, next: Next) -> Result<Response, AppError> {
    require_ownership(req, next, "id", OwnershipMode::SelfOnly).await
}

/// Every gate applied twice, sharing the state of `app`.
fn stacked(app: &TestApp) -> TestApp {
    let state = app.state.clone();
    let router = Router::new()
        .route("/owned/{id}", get(|| async { "owned" }))
        .route_layer(middleware::from_fn(self_only))
        .route_layer(middleware::from_fn(self_only))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .merge(
            Router::new()
                .route("/admin", get(|| async { "admin" }))
                .route_layer(middleware::from_fn(require_admin))
                .route_layer(middleware::from_fn(require_admin))
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        )
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state.clone(), translate_errors));

    TestApp { router, state }
}

#[tokio::test]
async fn test_stacked_ownership_gate_matches_single_gate() {
    let app = spawn_app();
    let owner = app.register("stackowner").await;
    let other = app.register("stackother").await;
    let admin = app.register_admin("stackadmin").await;
    let gated = stacked(&app);
    let path = format!("/owned/{}", owner.id);

    let own = gated.get(&path, Some(&owner.token)).await;
    assert_eq!(own.status, StatusCode::OK);

    let bypass = gated.get(&path, Some(&admin.token)).await;
    assert_eq!(bypass.status, StatusCode::OK);

    let denied = gated.get(&path, Some(&other.token)).await;
    assert_envelope(
        &denied,
        StatusCode::FORBIDDEN,
        "You can only access your own resources",
    );

    // Same outcome as the single gate on the real route.
    let single = app
        .request(
            Method::DELETE,
            &format!("/api/users/{}", owner.id),
            Some(&other.token),
            None,
        )
        .await;
    assert_eq!(single.status, denied.status);
    assert_eq!(single.body["error"], denied.body["error"]);
}

#[tokio::test]
async fn test_stacked_admin_gate_matches_single_gate() {
    let app = spawn_app();
    let user = app.register("stackuser").await;
    let admin = app.register_admin("stackboss").await;
    let gated = stacked(&app);

    let allowed = gated.get("/admin", Some(&admin.token)).await;
    assert_eq!(allowed.status, StatusCode::OK);

    let denied = gated.get("/admin", Some(&user.token)).await;
    assert_envelope(&denied, StatusCode::FORBIDDEN, "Insufficient permissions");

    let single = app.get("/api/users", Some(&user.token)).await;
    assert_eq!(single.status, denied.status);
    assert_eq!(single.body["details"], denied.body["details"]);
}
