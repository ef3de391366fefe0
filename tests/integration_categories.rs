mod common;

use axum::http::{Method, StatusCode};
use common::{assert_envelope, spawn_app};
use serde_json::json;

#[tokio::test]
async fn test_admin_manages_categories() {
    let app = spawn_app();
    let admin = app.register_admin("curator").await;

    let created = app
        .request(
            Method::POST,
            "/api/categories",
            Some(&admin.token),
            Some(json!({ "name": "  Rust  ", "description": "Systems programming" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    assert_eq!(created.body["name"], "Rust");
    let path = format!("/api/categories/{}", created.body["id"].as_str().unwrap());

    let updated = app
        .request(
            Method::PUT,
            &path,
            Some(&admin.token),
            Some(json!({ "description": "Fearless concurrency" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{:?}", updated.body);
    assert_eq!(updated.body["description"], "Fearless concurrency");

    let listed = app.get("/api/categories", None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body.as_array().unwrap().len(), 1);

    let deleted = app.request(Method::DELETE, &path, Some(&admin.token), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let missing = app.get(&path, None).await;
    assert_envelope(&missing, StatusCode::NOT_FOUND, "Category not found");
}

#[tokio::test]
async fn test_members_cannot_create_categories() {
    let app = spawn_app();
    let user = app.register("member").await;

    let response = app
        .request(
            Method::POST,
            "/api/categories",
            Some(&user.token),
            Some(json!({ "name": "Spam" })),
        )
        .await;

    assert_envelope(&response, StatusCode::FORBIDDEN, "Insufficient permissions");
}

#[tokio::test]
async fn test_duplicate_category_name() {
    let app = spawn_app();
    let admin = app.register_admin("dupcat").await;
    let body = json!({ "name": "Databases" });

    let first = app
        .request(Method::POST, "/api/categories", Some(&admin.token), Some(body.clone()))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app
        .request(Method::POST, "/api/categories", Some(&admin.token), Some(body))
        .await;
    assert_envelope(&second, StatusCode::BAD_REQUEST, "Duplicate field value");
    assert_eq!(second.body["details"], "name 'Databases' already exists");
}

#[tokio::test]
async fn test_post_with_unknown_category() {
    let app = spawn_app();
    let author = app.register("lost").await;

    let response = app
        .request(
            Method::POST,
            "/api/posts",
            Some(&author.token),
            Some(json!({
                "title": "Post in nowhere",
                "content": "text",
                "category_id": "00000000-0000-0000-0000-000000000042"
            })),
        )
        .await;

    assert_envelope(
        &response,
        StatusCode::BAD_REQUEST,
        "Referenced resource does not exist",
    );
}

#[tokio::test]
async fn test_deleting_category_uncategorizes_posts() {
    let app = spawn_app();
    let admin = app.register_admin("sweeper").await;
    let category = app
        .request(
            Method::POST,
            "/api/categories",
            Some(&admin.token),
            Some(json!({ "name": "Ephemeral" })),
        )
        .await;
    let category_id = category.body["id"].as_str().unwrap().to_string();
    let post = app
        .request(
            Method::POST,
            "/api/posts",
            Some(&admin.token),
            Some(json!({
                "title": "Filed under ephemeral",
                "content": "text",
                "status": "published",
                "category_id": category_id
            })),
        )
        .await;
    assert_eq!(post.status, StatusCode::CREATED, "{:?}", post.body);

    app.request(
        Method::DELETE,
        &format!("/api/categories/{category_id}"),
        Some(&admin.token),
        None,
    )
    .await;

    let reloaded = app
        .get(&format!("/api/posts/{}", post.body["id"].as_str().unwrap()), None)
        .await;
    assert_eq!(reloaded.status, StatusCode::OK);
    assert!(reloaded.body["category_id"].is_null());
}
