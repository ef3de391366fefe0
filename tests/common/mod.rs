#![allow(dead_code)]

use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use inkwell::inkwell_auth::Role;
use inkwell::inkwell_config::{AppConfig, AppEnvironment, PasswordConfig, RateLimitConfig};
use inkwell::inkwell_db::Storage;
use inkwell::inkwell_models::UserId;
use inkwell::router::init_router;
use inkwell::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "Secret123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// A user created through the public API.
pub struct TestUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub token: String,
}

/// Configuration for tests: cheap hashing, a private upload directory and
/// limits high enough that only the rate limit tests ever hit them.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig {
        environment: AppEnvironment::Test,
        password: PasswordConfig { hash_cost: 4 },
        rate_limit: RateLimitConfig {
            general_per_second: 1000,
            general_burst_size: 10_000,
            auth_per_second: 1000,
            auth_burst_size: 10_000,
        },
        ..AppConfig::default()
    };
    config.upload.dir = upload_dir();
    config.upload.max_bytes = 1024;
    config
}

fn upload_dir() -> PathBuf {
    std::env::temp_dir().join(format!("inkwell-test-{}", Uuid::new_v4().simple()))
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_config())
}

pub fn spawn_app_with(config: AppConfig) -> TestApp {
    let state = AppState::new(config, Storage::memory());
    TestApp {
        router: init_router(state.clone()),
        state,
    }
}

pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{}", &Uuid::new_v4().simple().to_string()[..8])
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn register(&self, prefix: &str) -> TestUser {
        let username = unique_name(prefix);
        let email = format!("{username}@example.com");
        let response = self
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({ "username": username, "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        TestUser {
            id: response.body["user"]["id"].as_str().unwrap().parse().unwrap(),
            username,
            email,
            token: response.body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Registers a user and promotes it straight in storage. The existing
    /// token picks up the new role on its next request.
    pub async fn register_admin(&self, prefix: &str) -> TestUser {
        let user = self.register(prefix).await;
        self.state
            .storage
            .users
            .set_role(user.id, Role::Admin)
            .await
            .unwrap()
            .unwrap();
        user
    }

    pub async fn create_post(&self, token: &str, title: &str, status: &str) -> Value {
        let response = self
            .request(
                Method::POST,
                "/api/posts",
                Some(token),
                Some(json!({ "title": title, "content": "Some content", "status": status })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body
    }
}

/// Asserts the common error envelope fields.
pub fn assert_envelope(response: &TestResponse, status: StatusCode, error: &str) {
    assert_eq!(response.status, status, "{:?}", response.body);
    assert_eq!(response.body["error"], error, "{:?}", response.body);
    assert_eq!(response.body["status"], status.as_u16());
    assert!(response.body["timestamp"].is_string());
    assert!(response.body["path"].is_string());
    assert!(response.body["method"].is_string());
}
