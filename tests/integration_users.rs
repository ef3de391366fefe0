mod common;

use axum::http::{Method, StatusCode};
use common::{assert_envelope, spawn_app};
use serde_json::json;

#[tokio::test]
async fn test_public_profile_hides_private_fields() {
    let app = spawn_app();
    let user = app.register("profile").await;
    let path = format!("/api/users/{}", user.id);

    let anonymous = app.get(&path, None).await;
    assert_eq!(anonymous.status, StatusCode::OK);
    assert_eq!(anonymous.body["username"], user.username);
    assert!(anonymous.body.get("email").is_none());

    let own = app.get(&path, Some(&user.token)).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["email"], user.email);
}

#[tokio::test]
async fn test_profile_with_bad_token_is_still_public() {
    let app = spawn_app();
    let user = app.register("optional").await;

    let response = app
        .get(&format!("/api/users/{}", user.id), Some("garbage"))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.get("email").is_none());
}

#[tokio::test]
async fn test_profile_invalid_id() {
    let app = spawn_app();

    let response = app.get("/api/users/not-a-uuid", None).await;

    assert_envelope(&response, StatusCode::BAD_REQUEST, "Invalid resource ID format");
}

#[tokio::test]
async fn test_deactivated_profile_visible_to_admin_only() {
    let app = spawn_app();
    let admin = app.register_admin("boss").await;
    let user = app.register("hidden").await;
    app.state
        .storage
        .users
        .set_active(user.id, false)
        .await
        .unwrap();
    let path = format!("/api/users/{}", user.id);

    let anonymous = app.get(&path, None).await;
    assert_envelope(&anonymous, StatusCode::NOT_FOUND, "User not found");

    let as_admin = app.get(&path, Some(&admin.token)).await;
    assert_eq!(as_admin.status, StatusCode::OK);
    assert_eq!(as_admin.body["is_active"], false);
}

#[tokio::test]
async fn test_update_own_profile() {
    let app = spawn_app();
    let user = app.register("editor").await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/users/{}", user.id),
            Some(&user.token),
            Some(json!({ "bio": "Writes about Rust" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["bio"], "Writes about Rust");
}

#[tokio::test]
async fn test_cannot_update_someone_else() {
    let app = spawn_app();
    let owner = app.register("owner").await;
    let intruder = app.register("intruder").await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/users/{}", owner.id),
            Some(&intruder.token),
            Some(json!({ "bio": "hacked" })),
        )
        .await;

    assert_envelope(
        &response,
        StatusCode::FORBIDDEN,
        "You can only access your own resources",
    );
}

#[tokio::test]
async fn test_malformed_id_is_forbidden_for_non_admin() {
    let app = spawn_app();
    let user = app.register("malformed").await;

    for method in [Method::PUT, Method::DELETE] {
        let response = app
            .request(
                method,
                "/api/users/not-a-uuid",
                Some(&user.token),
                Some(json!({ "bio": "nope" })),
            )
            .await;

        assert_envelope(
            &response,
            StatusCode::FORBIDDEN,
            "You can only access your own resources",
        );
    }
}

#[tokio::test]
async fn test_malformed_id_reaches_admin_as_invalid_id() {
    let app = spawn_app();
    let admin = app.register_admin("malformedadmin").await;

    let response = app
        .request(
            Method::PUT,
            "/api/users/not-a-uuid",
            Some(&admin.token),
            Some(json!({ "bio": "nope" })),
        )
        .await;

    assert_envelope(&response, StatusCode::BAD_REQUEST, "Invalid resource ID format");
}

#[tokio::test]
async fn test_update_requires_authentication() {
    let app = spawn_app();
    let user = app.register("anon").await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/users/{}", user.id),
            None,
            Some(json!({ "bio": "nope" })),
        )
        .await;

    assert_envelope(&response, StatusCode::UNAUTHORIZED, "Access denied");
}

#[tokio::test]
async fn test_admin_can_delete_any_account() {
    let app = spawn_app();
    let admin = app.register_admin("root").await;
    let user = app.register("doomed").await;
    let path = format!("/api/users/{}", user.id);

    let response = app.request(Method::DELETE, &path, Some(&admin.token), None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let again = app.request(Method::DELETE, &path, Some(&admin.token), None).await;
    assert_envelope(&again, StatusCode::NOT_FOUND, "User not found");
}

#[tokio::test]
async fn test_list_users_requires_admin() {
    let app = spawn_app();
    let user = app.register("plain").await;

    let response = app.get("/api/users", Some(&user.token)).await;

    assert_envelope(&response, StatusCode::FORBIDDEN, "Insufficient permissions");
    assert_eq!(response.body["details"], "Required role: admin");
}

#[tokio::test]
async fn test_list_users_paginates() {
    let app = spawn_app();
    let admin = app.register_admin("lister").await;
    for _ in 0..3 {
        app.register("member").await;
    }

    let response = app.get("/api/users?limit=2&page=1", Some(&admin.token)).await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 2);
    assert_eq!(response.body["meta"]["total"], 4);
    assert_eq!(response.body["meta"]["has_more"], true);
}

#[tokio::test]
async fn test_admin_changes_status_and_role() {
    let app = spawn_app();
    let admin = app.register_admin("chief").await;
    let user = app.register("target").await;

    let status = app
        .request(
            Method::PATCH,
            &format!("/api/users/{}/status", user.id),
            Some(&admin.token),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(status.status, StatusCode::OK, "{:?}", status.body);
    assert_eq!(status.body["is_active"], false);

    let blocked = app.get("/api/auth/me", Some(&user.token)).await;
    assert_envelope(&blocked, StatusCode::FORBIDDEN, "Account deactivated");

    let role = app
        .request(
            Method::PATCH,
            &format!("/api/users/{}/role", user.id),
            Some(&admin.token),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(role.status, StatusCode::OK, "{:?}", role.body);
    assert_eq!(role.body["role"], "admin");
}

#[tokio::test]
async fn test_admin_cannot_lock_themselves_out() {
    let app = spawn_app();
    let admin = app.register_admin("self").await;

    let status = app
        .request(
            Method::PATCH,
            &format!("/api/users/{}/status", admin.id),
            Some(&admin.token),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_envelope(&status, StatusCode::BAD_REQUEST, "You cannot deactivate your own account");

    let role = app
        .request(
            Method::PATCH,
            &format!("/api/users/{}/role", admin.id),
            Some(&admin.token),
            Some(json!({ "role": "user" })),
        )
        .await;
    assert_envelope(&role, StatusCode::BAD_REQUEST, "You cannot remove your own admin role");
}

#[tokio::test]
async fn test_role_change_rejects_unknown_role() {
    let app = spawn_app();
    let admin = app.register_admin("typo").await;
    let user = app.register("subject").await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/users/{}/role", user.id),
            Some(&admin.token),
            Some(json!({ "role": "emperor" })),
        )
        .await;

    assert_envelope(&response, StatusCode::BAD_REQUEST, "Validation Error");
}
