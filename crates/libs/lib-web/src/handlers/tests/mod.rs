//! # Handler Tests
//!
//! Drive the real router (middleware included) against an in-memory database.

mod messages;

use crate::server::{create_router, AppState};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use lib_auth::identity::IDENTITY_SECRET_HEADER;
use lib_core::{create_in_memory_pool, Config, DbPool};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_SESSION_SECRET: &str = "test-session-secret-at-least-32-characters!";
pub const TEST_IDENTITY_SECRET: &str = "test-identity-gateway-secret";

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        session_secret: TEST_SESSION_SECRET.to_string(),
        session_expiration_hours: 24,
        identity_secret: TEST_IDENTITY_SECRET.to_string(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
}

/// A signed-in test user.
pub struct TestUser {
    pub id: String,
    pub token: String,
}

pub async fn test_app() -> TestApp {
    let pool = create_in_memory_pool()
        .await
        .expect("Failed to create test database");

    let state = AppState {
        db: pool.clone(),
        config: test_config(),
    };

    TestApp {
        router: create_router(state, &["http://localhost:3000".to_string()]),
        pool,
    }
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    builder.body(Body::empty()).unwrap()
}

pub fn sign_in_request(body: Value) -> Request<Body> {
    let mut request = json_request(Method::POST, "/api/auth/callback", None, body);
    request
        .headers_mut()
        .insert(IDENTITY_SECRET_HEADER, TEST_IDENTITY_SECRET.parse().unwrap());
    request
}

impl TestApp {
    /// Send a request and return the status with the body parsed as JSON
    /// (`Value::Null` for an empty or non-JSON body).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn sign_in(&self, email: &str, name: &str) -> TestUser {
        let (status, body) = self
            .send(sign_in_request(json!({
                "email": email,
                "name": name,
                "provider": "github",
                "providerAccountId": format!("gh-{email}"),
            })))
            .await;
        assert_eq!(status, StatusCode::OK, "sign-in failed: {body}");

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Id of the caller's assistant conversation, created by listing.
    pub async fn assistant_conversation_id(&self, user: &TestUser) -> String {
        let (status, body) = self.send(get_request("/api/conversations", Some(&user.token))).await;
        assert_eq!(status, StatusCode::OK);
        body["conversations"][0]["id"].as_str().unwrap().to_string()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

// region: --- Routing

#[tokio::test]
async fn test_health() {
    let app = test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(get_request("/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = test_app().await;

    let (status, body) = app.send(get_request("/api/nope", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Route not found");
}

#[tokio::test]
async fn test_other_methods_are_405() {
    let app = test_app().await;
    let user = app.sign_in("a@x.com", "Alice").await;

    for uri in ["/api/conversations", "/api/messages"] {
        let response = app
            .router
            .clone()
            .oneshot(json_request(Method::DELETE, uri, Some(&user.token), json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, POST");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Method not allowed" }));

        let head = Request::builder()
            .method(Method::HEAD)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", user.token))
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(head).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET, POST");
    }
}

// endregion: --- Routing
