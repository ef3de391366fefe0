mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use common::{TestApp, TestResponse, assert_envelope, spawn_app};
use serde_json::json;

const BOUNDARY: &str = "inkwell-test-boundary";

fn multipart_body(field: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"cover.bin\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload_cover(
    app: &TestApp,
    post_id: &str,
    token: &str,
    field: &str,
    content_type: &str,
    bytes: &[u8],
) -> TestResponse {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/posts/{post_id}/cover"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, content_type, bytes)))
        .unwrap();
    app.send(request).await
}

#[tokio::test]
async fn test_create_post_sets_author_and_slug() {
    let app = spawn_app();
    let author = app.register("author").await;

    let post = app
        .create_post(&author.token, "Hello, Axum World!", "published")
        .await;

    assert_eq!(post["slug"], "hello-axum-world");
    assert_eq!(post["author_id"], author.id.to_string());
    assert_eq!(post["status"], "published");
    assert!(post["published_at"].is_string());
}

#[tokio::test]
async fn test_create_post_requires_authentication() {
    let app = spawn_app();

    let response = app
        .request(
            Method::POST,
            "/api/posts",
            None,
            Some(json!({ "title": "Anonymous post", "content": "x" })),
        )
        .await;

    assert_envelope(&response, StatusCode::UNAUTHORIZED, "Access denied");
}

#[tokio::test]
async fn test_create_post_authenticates_before_validating() {
    let app = spawn_app();

    let response = app
        .request(
            Method::POST,
            "/api/posts",
            None,
            Some(json!({ "title": "abcd", "content": "x" })),
        )
        .await;

    assert_envelope(&response, StatusCode::UNAUTHORIZED, "Access denied");
    assert_eq!(response.body["details"], "No token provided");
}

#[tokio::test]
async fn test_create_post_duplicate_slug() {
    let app = spawn_app();
    let author = app.register("dupslug").await;
    app.create_post(&author.token, "Same title here", "draft").await;

    let response = app
        .request(
            Method::POST,
            "/api/posts",
            Some(&author.token),
            Some(json!({ "title": "Same Title Here!", "content": "again" })),
        )
        .await;

    assert_envelope(&response, StatusCode::BAD_REQUEST, "Duplicate field value");
    assert_eq!(response.body["details"], "slug 'same-title-here' already exists");
}

#[tokio::test]
async fn test_create_post_title_without_letters() {
    let app = spawn_app();
    let author = app.register("symbols").await;

    let response = app
        .request(
            Method::POST,
            "/api/posts",
            Some(&author.token),
            Some(json!({ "title": "!!!!!!", "content": "x" })),
        )
        .await;

    assert_envelope(
        &response,
        StatusCode::BAD_REQUEST,
        "Title must contain at least one letter or number",
    );
}

#[tokio::test]
async fn test_drafts_visible_to_author_and_admin_only() {
    let app = spawn_app();
    let author = app.register("drafter").await;
    let other = app.register("reader").await;
    let admin = app.register_admin("editor").await;
    let draft = app.create_post(&author.token, "My secret draft", "draft").await;
    app.create_post(&author.token, "My public post", "published")
        .await;
    let path = format!("/api/posts/{}", draft["id"].as_str().unwrap());

    let anonymous = app.get(&path, None).await;
    assert_envelope(&anonymous, StatusCode::NOT_FOUND, "Post not found");
    let stranger = app.get(&path, Some(&other.token)).await;
    assert_envelope(&stranger, StatusCode::NOT_FOUND, "Post not found");
    assert_eq!(app.get(&path, Some(&author.token)).await.status, StatusCode::OK);
    assert_eq!(app.get(&path, Some(&admin.token)).await.status, StatusCode::OK);

    let public_list = app.get("/api/posts", None).await;
    assert_eq!(public_list.body["meta"]["total"], 1);
    let author_list = app.get("/api/posts", Some(&author.token)).await;
    assert_eq!(author_list.body["meta"]["total"], 2);
    let drafts_only = app.get("/api/posts?status=draft", Some(&admin.token)).await;
    assert_eq!(drafts_only.body["meta"]["total"], 1);
}

#[tokio::test]
async fn test_list_posts_rejects_bad_query() {
    let app = spawn_app();

    let response = app.get("/api/posts?status=archived", None).await;

    assert_envelope(&response, StatusCode::BAD_REQUEST, "Validation Error");
}

#[tokio::test]
async fn test_list_posts_rejects_page_beyond_limit() {
    let app = spawn_app();

    let response = app
        .get(&format!("/api/posts?page={}", i64::MAX), None)
        .await;

    assert_envelope(&response, StatusCode::BAD_REQUEST, "Validation Error");
    assert_eq!(response.body["details"][0]["field"], "page");
}

#[tokio::test]
async fn test_list_posts_far_page_is_empty() {
    let app = spawn_app();
    let author = app.register("paged").await;
    app.create_post(&author.token, "Only post here", "published").await;

    let response = app.get("/api/posts?page=1000000&limit=100", None).await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert!(response.body["data"].as_array().unwrap().is_empty());
    assert_eq!(response.body["meta"]["total"], 1);
    assert_eq!(response.body["meta"]["has_more"], false);
}

#[tokio::test]
async fn test_update_post_by_owner_and_not_by_others() {
    let app = spawn_app();
    let author = app.register("owner").await;
    let other = app.register("other").await;
    let post = app.create_post(&author.token, "Original title", "published").await;
    let path = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let forbidden = app
        .request(
            Method::PUT,
            &path,
            Some(&other.token),
            Some(json!({ "title": "Stolen title" })),
        )
        .await;
    assert_envelope(
        &forbidden,
        StatusCode::FORBIDDEN,
        "You can only modify your own posts",
    );

    let updated = app
        .request(
            Method::PUT,
            &path,
            Some(&author.token),
            Some(json!({ "title": "Better title" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{:?}", updated.body);
    assert_eq!(updated.body["title"], "Better title");
    assert_eq!(updated.body["slug"], "better-title");
}

#[tokio::test]
async fn test_admin_can_delete_any_post() {
    let app = spawn_app();
    let author = app.register("victim").await;
    let admin = app.register_admin("moderator").await;
    let post = app.create_post(&author.token, "Spam spam spam", "published").await;
    let path = format!("/api/posts/{}", post["id"].as_str().unwrap());

    let response = app.request(Method::DELETE, &path, Some(&admin.token), None).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let gone = app.get(&path, None).await;
    assert_envelope(&gone, StatusCode::NOT_FOUND, "Post not found");
}

#[tokio::test]
async fn test_post_invalid_id() {
    let app = spawn_app();
    let author = app.register("badid").await;

    let response = app
        .request(Method::DELETE, "/api/posts/12345", Some(&author.token), None)
        .await;

    assert_envelope(&response, StatusCode::BAD_REQUEST, "Invalid resource ID format");
}

#[tokio::test]
async fn test_upload_cover() {
    let app = spawn_app();
    let author = app.register("painter").await;
    let post = app.create_post(&author.token, "Post with a cover", "draft").await;
    let id = post["id"].as_str().unwrap();

    let response = upload_cover(&app, id, &author.token, "cover", "image/png", b"\x89PNG fake").await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let url = response.body["cover_image"].as_str().unwrap();
    assert!(url.contains("/covers/"));
    assert!(url.ends_with(".png"));
}

#[tokio::test]
async fn test_upload_cover_rejects_non_images() {
    let app = spawn_app();
    let author = app.register("texter").await;
    let post = app.create_post(&author.token, "Post with a text cover", "draft").await;
    let id = post["id"].as_str().unwrap();

    let response = upload_cover(&app, id, &author.token, "cover", "text/plain", b"hello").await;

    assert_envelope(&response, StatusCode::BAD_REQUEST, "Only image files are allowed");
}

#[tokio::test]
async fn test_upload_cover_rejects_unexpected_field() {
    let app = spawn_app();
    let author = app.register("fields").await;
    let post = app.create_post(&author.token, "Post with odd field", "draft").await;
    let id = post["id"].as_str().unwrap();

    let response = upload_cover(&app, id, &author.token, "avatar", "image/png", b"png").await;

    assert_envelope(&response, StatusCode::BAD_REQUEST, "Unexpected file field");
}

#[tokio::test]
async fn test_upload_cover_too_large() {
    let app = spawn_app();
    let author = app.register("bigfile").await;
    let post = app.create_post(&author.token, "Post with huge cover", "draft").await;
    let id = post["id"].as_str().unwrap();
    let max = app.state.config.upload.max_bytes;

    let response = upload_cover(&app, id, &author.token, "cover", "image/png", &vec![0u8; max + 1]).await;

    assert_envelope(&response, StatusCode::BAD_REQUEST, "File too large");
}

#[tokio::test]
async fn test_upload_cover_by_other_user() {
    let app = spawn_app();
    let author = app.register("artist").await;
    let other = app.register("vandal").await;
    let post = app.create_post(&author.token, "Protected cover post", "published").await;
    let id = post["id"].as_str().unwrap();

    let response = upload_cover(&app, id, &other.token, "cover", "image/png", b"png").await;

    assert_envelope(&response, StatusCode::FORBIDDEN, "You can only modify your own posts");
}
