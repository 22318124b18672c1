//! Integration tests for newsletter creation and the append-only version log.

use pressroom_core::campaign_status::NewsletterStatus;
use pressroom_db::models::client::CreateClient;
use pressroom_db::models::newsletter::CreateNewsletter;
use pressroom_db::repositories::{ClientRepo, NewsletterRepo, NewsletterVersionRepo};
use serde_json::json;
use sqlx::PgPool;

async fn new_newsletter(pool: &PgPool) -> pressroom_db::models::newsletter::Newsletter {
    let client = ClientRepo::create(
        pool,
        &CreateClient {
            name: "Acme Realty".to_string(),
        },
    )
    .await
    .unwrap();

    NewsletterRepo::create(
        pool,
        client.id,
        &CreateNewsletter {
            title: "March Market Update".to_string(),
            document: Some(json!({"blocks": [{"type": "heading", "text": "v1"}]})),
            expected_send_date: None,
            invoice_id: None,
            subscription_id: None,
        },
        Some(42),
    )
    .await
    .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_makes_initial_version(pool: PgPool) {
    let newsletter = new_newsletter(&pool).await;
    assert_eq!(newsletter.status(), Some(NewsletterStatus::Draft));
    assert_eq!(newsletter.created_by, Some(42));

    let versions = NewsletterVersionRepo::list_by_newsletter(&pool, newsletter.id)
        .await
        .unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version_number, 1);
    assert_eq!(versions[0].change_summary.as_deref(), Some("Initial version"));
    assert_eq!(newsletter.current_version_id, Some(versions[0].id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_content_appends_and_moves_pointer(pool: PgPool) {
    let newsletter = new_newsletter(&pool).await;
    let doc = json!({"blocks": [{"type": "heading", "text": "v2"}]});

    let v2 = NewsletterVersionRepo::save_content(&pool, newsletter.id, &doc, Some("edit"), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(v2.version_number, 2);

    let stored = NewsletterRepo::find_by_id(&pool, newsletter.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.current_version_id, Some(v2.id));
    assert_eq!(stored.document, doc);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_content_for_missing_newsletter(pool: PgPool) {
    let result = NewsletterVersionRepo::save_content(&pool, 999_999, &json!({}), None, None)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_restore_adds_exactly_one_version(pool: PgPool) {
    let newsletter = new_newsletter(&pool).await;
    let v1 = NewsletterVersionRepo::list_by_newsletter(&pool, newsletter.id)
        .await
        .unwrap()
        .remove(0);
    NewsletterVersionRepo::save_content(&pool, newsletter.id, &json!({"blocks": ["v2"]}), None, None)
        .await
        .unwrap();

    let before = NewsletterVersionRepo::list_by_newsletter(&pool, newsletter.id)
        .await
        .unwrap();

    let restored = NewsletterVersionRepo::restore(&pool, newsletter.id, v1.id, None, Some(7))
        .await
        .unwrap()
        .unwrap();

    let after = NewsletterVersionRepo::list_by_newsletter(&pool, newsletter.id)
        .await
        .unwrap();
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(restored.version_number, 3);
    assert_eq!(
        restored.change_summary.as_deref(),
        Some("Restored from version 1")
    );

    // History is intact: every earlier version is still present, newest first.
    let numbers: Vec<i32> = after.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![3, 2, 1]);

    let original = NewsletterVersionRepo::find_for_newsletter(&pool, newsletter.id, v1.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(restored.content, original.content);

    let stored = NewsletterRepo::find_by_id(&pool, newsletter.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.current_version_id, Some(restored.id));
    assert_eq!(stored.document, original.content);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_restore_rejects_foreign_version(pool: PgPool) {
    let first = new_newsletter(&pool).await;
    let second = new_newsletter(&pool).await;
    let foreign = NewsletterVersionRepo::list_by_newsletter(&pool, second.id)
        .await
        .unwrap()
        .remove(0);

    let result = NewsletterVersionRepo::restore(&pool, first.id, foreign.id, None, None)
        .await
        .unwrap();
    assert!(result.is_none());

    let versions = NewsletterVersionRepo::list_by_newsletter(&pool, first.id)
        .await
        .unwrap();
    assert_eq!(versions.len(), 1, "failed restore must not add a version");

    assert!(
        NewsletterVersionRepo::find_for_newsletter(&pool, first.id, foreign.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_saves_get_distinct_numbers(pool: PgPool) {
    let newsletter = new_newsletter(&pool).await;

    let mut handles = Vec::new();
    for i in 0..5 {
        let pool = pool.clone();
        let id = newsletter.id;
        handles.push(tokio::spawn(async move {
            NewsletterVersionRepo::save_content(&pool, id, &json!({"n": i}), None, None)
                .await
                .unwrap()
                .unwrap()
                .version_number
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap());
    }
    numbers.sort();
    assert_eq!(numbers, vec![2, 3, 4, 5, 6]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_status_writes_are_compare_and_set(pool: PgPool) {
    let newsletter = new_newsletter(&pool).await;

    let moved = NewsletterRepo::update_status(
        &pool,
        newsletter.id,
        NewsletterStatus::Draft,
        NewsletterStatus::InReview,
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(moved.status(), Some(NewsletterStatus::InReview));

    let stale = NewsletterRepo::update_status(
        &pool,
        newsletter.id,
        NewsletterStatus::Draft,
        NewsletterStatus::Approved,
    )
    .await
    .unwrap();
    assert!(stale.is_none(), "stale expected status must not apply");

    let filtered = NewsletterRepo::list_by_client(
        &pool,
        newsletter.client_id,
        Some(NewsletterStatus::InReview),
    )
    .await
    .unwrap();
    assert_eq!(filtered.len(), 1);
    let none = NewsletterRepo::list_by_client(
        &pool,
        newsletter.client_id,
        Some(NewsletterStatus::Sent),
    )
    .await
    .unwrap();
    assert!(none.is_empty());
}
