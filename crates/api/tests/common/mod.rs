#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use pressroom_api::auth::jwt::{generate_access_token, JwtConfig};
use pressroom_api::config::{ServerConfig, DEFAULT_IMPORT_MAX_BYTES};
use pressroom_api::delivery::LogDeliveryProvider;
use pressroom_api::router::build_app_router;
use pressroom_api::state::AppState;
use pressroom_core::delivery::DeliveryProvider;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        import_max_bytes: DEFAULT_IMPORT_MAX_BYTES,
        jwt: JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router over `pool` with the logging
/// delivery provider.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_delivery(pool, Arc::new(LogDeliveryProvider))
}

/// Build the full application router with a specific delivery provider.
///
/// Goes through [`build_app_router`] so tests exercise the same middleware
/// stack as the binary.
pub fn build_test_app_with_delivery(pool: PgPool, delivery: Arc<dyn DeliveryProvider>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        delivery,
    };
    build_app_router(state, &config)
}

/// A bearer token for `user_id` signed with the test secret.
pub fn bearer_token(user_id: i64) -> String {
    let token = generate_access_token(user_id, "editor", &test_config().jwt).unwrap();
    format!("Bearer {token}")
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::POST, uri, body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request(Method::PUT, uri, body)).await
}

/// POST with an `Authorization` header.
pub async fn post_json_as(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    auth: &str,
) -> Response<Body> {
    let mut request = json_request(Method::POST, uri, body);
    request
        .headers_mut()
        .insert(AUTHORIZATION, auth.parse().unwrap());
    send(app, request).await
}

/// POST a raw text body, as CSV uploads are sent.
pub async fn post_text(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "text/csv")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Create a client through the API and return its id.
pub async fn create_client(pool: &PgPool, name: &str) -> i64 {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/clients",
        serde_json::json!({ "name": name }),
    )
    .await;
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create a contact through the API and return its id.
pub async fn create_contact(pool: &PgPool, client_id: i64, email: &str, tags: &[&str]) -> i64 {
    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/clients/{client_id}/contacts"),
        serde_json::json!({ "email": email, "tags": tags }),
    )
    .await;
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create a newsletter with content and return its id.
pub async fn create_newsletter(pool: &PgPool, client_id: i64, title: &str) -> i64 {
    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/clients/{client_id}/newsletters"),
        serde_json::json!({
            "title": title,
            "document": { "blocks": [{ "type": "text", "text": "Hello" }] },
        }),
    )
    .await;
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
