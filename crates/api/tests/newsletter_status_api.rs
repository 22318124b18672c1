//! HTTP-level tests for the newsletter workflow: status changes,
//! scheduling, delivery, and test sends.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{
    body_json, build_test_app, build_test_app_with_delivery, create_client, create_contact,
    create_newsletter, get, post_json, put_json,
};
use pressroom_core::delivery::{DeliveryError, DeliveryProvider, DeliveryReceipt, OutboundMessage};
use serde_json::json;
use sqlx::PgPool;

/// Provider that refuses everything and counts attempts.
#[derive(Default)]
struct FailingProvider {
    attempts: AtomicUsize,
}

#[async_trait]
impl DeliveryProvider for FailingProvider {
    async fn send_test(&self, _message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(DeliveryError::Unavailable("smtp relay down".into()))
    }

    async fn deliver(&self, _message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(DeliveryError::Unavailable("smtp relay down".into()))
    }
}

/// Provider that accepts after a delay and counts deliveries.
#[derive(Default)]
struct SlowProvider {
    deliveries: AtomicUsize,
}

#[async_trait]
impl DeliveryProvider for SlowProvider {
    async fn send_test(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        Ok(DeliveryReceipt {
            provider_message_id: None,
            accepted_recipients: message.recipients.len(),
        })
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        Ok(DeliveryReceipt {
            provider_message_id: None,
            accepted_recipients: message.recipients.len(),
        })
    }
}

async fn set_status(pool: &PgPool, id: i64, status: &str) -> axum::response::Response {
    put_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/newsletters/{id}/status"),
        json!({ "status": status }),
    )
    .await
}

async fn current_status(pool: &PgPool, id: i64) -> i64 {
    let json = body_json(get(build_test_app(pool.clone()), &format!("/api/v1/newsletters/{id}")).await).await;
    json["data"]["status_id"].as_i64().unwrap()
}

async fn approved_newsletter(pool: &PgPool) -> (i64, i64) {
    let client_id = create_client(pool, "Acme").await;
    create_contact(pool, client_id, "ann@example.com", &[]).await;
    let id = create_newsletter(pool, client_id, "March issue").await;
    assert_eq!(set_status(pool, id, "approved").await.status(), StatusCode::OK);
    (client_id, id)
}

// ---------------------------------------------------------------------------
// Generic status changes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn new_newsletter_starts_in_draft(pool: PgPool) {
    let client_id = create_client(&pool, "Acme").await;
    let id = create_newsletter(&pool, client_id, "March issue").await;
    assert_eq!(current_status(&pool, id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn setting_sent_directly_is_rejected(pool: PgPool) {
    let client_id = create_client(&pool, "Acme").await;
    let id = create_newsletter(&pool, client_id, "March issue").await;

    let response = set_status(&pool, id, "sent").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("automatically"));
    assert_eq!(current_status(&pool, id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn setting_scheduled_directly_is_rejected(pool: PgPool) {
    let client_id = create_client(&pool, "Acme").await;
    let id = create_newsletter(&pool, client_id, "March issue").await;

    let response = set_status(&pool, id, "scheduled").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("schedule action"));
    assert_eq!(current_status(&pool, id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn review_then_approve_succeeds(pool: PgPool) {
    let client_id = create_client(&pool, "Acme").await;
    let id = create_newsletter(&pool, client_id, "March issue").await;

    assert_eq!(set_status(&pool, id, "in_review").await.status(), StatusCode::OK);
    let response = set_status(&pool, id, "approved").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status_id"], 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_status_is_400(pool: PgPool) {
    let client_id = create_client(&pool, "Acme").await;
    let id = create_newsletter(&pool, client_id, "March issue").await;
    assert_eq!(
        set_status(&pool, id, "published").await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_by_status(pool: PgPool) {
    let client_id = create_client(&pool, "Acme").await;
    let draft = create_newsletter(&pool, client_id, "Draft issue").await;
    let review = create_newsletter(&pool, client_id, "Review issue").await;
    set_status(&pool, review, "in_review").await;

    let base = format!("/api/v1/clients/{client_id}/newsletters");
    let json = body_json(get(build_test_app(pool.clone()), &format!("{base}?status=draft")).await).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![draft]);

    let response = get(build_test_app(pool), &format!("{base}?status=bogus")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Schedule and send
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn draft_cannot_be_scheduled_or_sent(pool: PgPool) {
    let client_id = create_client(&pool, "Acme").await;
    let id = create_newsletter(&pool, client_id, "March issue").await;

    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/newsletters/{id}/schedule"),
        json!({ "scheduled_for": Utc::now() + Duration::days(1) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/newsletters/{id}/send"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(current_status(&pool, id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn schedule_requires_future_time(pool: PgPool) {
    let (_, id) = approved_newsletter(&pool).await;

    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/newsletters/{id}/schedule"),
        json!({ "scheduled_for": Utc::now() - Duration::hours(1) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(current_status(&pool, id).await, 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn approved_newsletter_can_be_scheduled_then_sent(pool: PgPool) {
    let (_, id) = approved_newsletter(&pool).await;

    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/newsletters/{id}/schedule"),
        json!({ "scheduled_for": Utc::now() + Duration::days(2) }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status_id"], 6);
    assert!(json["data"]["scheduled_for"].is_string());

    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/newsletters/{id}/send"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status_id"], 7);
    assert!(json["data"]["sent_at"].is_string());

    // A sent newsletter cannot be sent again.
    let response = post_json(
        build_test_app(pool),
        &format!("/api/v1/newsletters/{id}/send"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_delivery_leaves_status_unchanged(pool: PgPool) {
    let (_, id) = approved_newsletter(&pool).await;
    let provider = Arc::new(FailingProvider::default());

    let response = post_json(
        build_test_app_with_delivery(pool.clone(), provider.clone()),
        &format!("/api/v1/newsletters/{id}/send"),
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(provider.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(current_status(&pool, id).await, 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_sends_deliver_once(pool: PgPool) {
    let (_, id) = approved_newsletter(&pool).await;
    let provider = Arc::new(SlowProvider::default());
    let uri = format!("/api/v1/newsletters/{id}/send");

    let (first, second) = tokio::join!(
        post_json(
            build_test_app_with_delivery(pool.clone(), provider.clone()),
            &uri,
            json!({}),
        ),
        post_json(
            build_test_app_with_delivery(pool.clone(), provider.clone()),
            &uri,
            json!({}),
        ),
    );

    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
    assert_eq!(provider.deliveries.load(Ordering::SeqCst), 1);
    assert_eq!(current_status(&pool, id).await, 7);
}

// ---------------------------------------------------------------------------
// Test sends
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn send_test_never_changes_status(pool: PgPool) {
    let client_id = create_client(&pool, "Acme").await;
    let id = create_newsletter(&pool, client_id, "March issue").await;

    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/newsletters/{id}/send-test"),
        json!({ "to_email": "Editor@Example.com" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["delivered"], true);
    assert_eq!(json["data"]["to_email"], "editor@example.com");
    assert_eq!(current_status(&pool, id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_send_test_is_reported_and_status_unchanged(pool: PgPool) {
    let (_, id) = approved_newsletter(&pool).await;
    let provider = Arc::new(FailingProvider::default());

    let response = post_json(
        build_test_app_with_delivery(pool.clone(), provider.clone()),
        &format!("/api/v1/newsletters/{id}/send-test"),
        json!({ "to_email": "editor@example.com" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["delivered"], false);
    assert!(json["data"]["error"].as_str().unwrap().contains("smtp relay down"));
    assert_eq!(provider.attempts.load(Ordering::SeqCst), 1);
    assert_eq!(current_status(&pool, id).await, 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn send_test_to_invalid_address_is_400(pool: PgPool) {
    let client_id = create_client(&pool, "Acme").await;
    let id = create_newsletter(&pool, client_id, "March issue").await;

    let response = post_json(
        build_test_app(pool),
        &format!("/api/v1/newsletters/{id}/send-test"),
        json!({ "to_email": "nope" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
