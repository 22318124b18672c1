//! Repository for the `newsletters` table.
//!
//! Status writes are compare-and-set on `status_id`: the caller passes the
//! status it validated against, and a `None` result means another request
//! changed the newsletter in between.
//!
//! Delivery is the exception: [`NewsletterRepo::lock_for_send`] holds the row
//! lock for the whole provider call, so two sends of one newsletter run one
//! after the other and the second sees `sent`.

use pressroom_core::campaign_status::NewsletterStatus;
use pressroom_core::types::{DbId, Timestamp};
use pressroom_core::versioning::INITIAL_VERSION_SUMMARY;
use sqlx::{PgConnection, PgPool};

use crate::models::newsletter::{CreateNewsletter, Newsletter, UpdateNewsletter};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, client_id, title, status_id, document, current_version_id, \
    expected_send_date, scheduled_for, sent_at, invoice_id, subscription_id, created_by, \
    created_at, updated_at";

/// Provides CRUD and workflow operations for newsletters.
pub struct NewsletterRepo;

impl NewsletterRepo {
    /// Insert a draft newsletter and its first version in one transaction.
    pub async fn create(
        pool: &PgPool,
        client_id: DbId,
        input: &CreateNewsletter,
        created_by: Option<DbId>,
    ) -> Result<Newsletter, sqlx::Error> {
        let document = input
            .document
            .clone()
            .unwrap_or_else(|| serde_json::json!({}));

        let mut tx = pool.begin().await?;

        let newsletter_id: DbId = sqlx::query_scalar(
            "INSERT INTO newsletters
                (client_id, title, status_id, document, expected_send_date,
                 invoice_id, subscription_id, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(client_id)
        .bind(&input.title)
        .bind(NewsletterStatus::Draft.id())
        .bind(&document)
        .bind(input.expected_send_date)
        .bind(&input.invoice_id)
        .bind(&input.subscription_id)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let version_id: DbId = sqlx::query_scalar(
            "INSERT INTO newsletter_versions
                (newsletter_id, version_number, content, change_summary, created_by)
             VALUES ($1, 1, $2, $3, $4)
             RETURNING id",
        )
        .bind(newsletter_id)
        .bind(&document)
        .bind(INITIAL_VERSION_SUMMARY)
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE newsletters SET current_version_id = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        let newsletter = sqlx::query_as::<_, Newsletter>(&query)
            .bind(newsletter_id)
            .bind(version_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(newsletter)
    }

    /// Find a newsletter by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Newsletter>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM newsletters WHERE id = $1");
        sqlx::query_as::<_, Newsletter>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a client's newsletters, newest first, optionally in one status.
    pub async fn list_by_client(
        pool: &PgPool,
        client_id: DbId,
        status: Option<NewsletterStatus>,
    ) -> Result<Vec<Newsletter>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM newsletters
             WHERE client_id = $1 AND ($2::SMALLINT IS NULL OR status_id = $2)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Newsletter>(&query)
            .bind(client_id)
            .bind(status.map(NewsletterStatus::id))
            .fetch_all(pool)
            .await
    }

    /// Update metadata. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateNewsletter,
    ) -> Result<Option<Newsletter>, sqlx::Error> {
        let query = format!(
            "UPDATE newsletters SET
                title = COALESCE($2, title),
                expected_send_date = COALESCE($3, expected_send_date),
                invoice_id = COALESCE($4, invoice_id),
                subscription_id = COALESCE($5, subscription_id)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Newsletter>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(input.expected_send_date)
            .bind(&input.invoice_id)
            .bind(&input.subscription_id)
            .fetch_optional(pool)
            .await
    }

    /// Move a newsletter from `expected` to `target`. Leaving `scheduled`
    /// clears the pending send time.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        expected: NewsletterStatus,
        target: NewsletterStatus,
    ) -> Result<Option<Newsletter>, sqlx::Error> {
        let query = format!(
            "UPDATE newsletters SET
                status_id = $3,
                scheduled_for = CASE WHEN $3 = $4 THEN scheduled_for ELSE NULL END
             WHERE id = $1 AND status_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Newsletter>(&query)
            .bind(id)
            .bind(expected.id())
            .bind(target.id())
            .bind(NewsletterStatus::Scheduled.id())
            .fetch_optional(pool)
            .await
    }

    /// Mark a newsletter scheduled for `scheduled_for`.
    pub async fn schedule(
        pool: &PgPool,
        id: DbId,
        expected: NewsletterStatus,
        scheduled_for: Timestamp,
    ) -> Result<Option<Newsletter>, sqlx::Error> {
        let query = format!(
            "UPDATE newsletters SET status_id = $3, scheduled_for = $4
             WHERE id = $1 AND status_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Newsletter>(&query)
            .bind(id)
            .bind(expected.id())
            .bind(NewsletterStatus::Scheduled.id())
            .bind(scheduled_for)
            .fetch_optional(pool)
            .await
    }

    /// Load a newsletter and lock its row until the surrounding transaction
    /// ends. Concurrent callers wait here.
    pub async fn lock_for_send(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Newsletter>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM newsletters WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Newsletter>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Mark a newsletter sent after the provider accepted it. Runs inside the
    /// transaction that took [`NewsletterRepo::lock_for_send`].
    pub async fn mark_sent(
        conn: &mut PgConnection,
        id: DbId,
        expected: NewsletterStatus,
    ) -> Result<Option<Newsletter>, sqlx::Error> {
        let query = format!(
            "UPDATE newsletters SET status_id = $3, sent_at = NOW()
             WHERE id = $1 AND status_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Newsletter>(&query)
            .bind(id)
            .bind(expected.id())
            .bind(NewsletterStatus::Sent.id())
            .fetch_optional(conn)
            .await
    }
}
