//! Repository for the `newsletter_versions` table.
//!
//! Versions are only ever inserted. Every insert runs in a transaction that
//! first locks the parent newsletter row, so concurrent saves on the same
//! newsletter are serialised and receive distinct, increasing numbers.

use pressroom_core::types::DbId;
use pressroom_core::versioning::{next_version_number, plan_restore};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::newsletter_version::{NewsletterVersion, NewsletterVersionSummary};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, newsletter_id, version_number, content, change_summary, created_by, created_at, updated_at";

/// Provides append-only version operations.
pub struct NewsletterVersionRepo;

impl NewsletterVersionRepo {
    /// Store `document` as the newsletter's next version and make it current.
    ///
    /// Returns `None` if the newsletter does not exist.
    pub async fn save_content(
        pool: &PgPool,
        newsletter_id: DbId,
        document: &serde_json::Value,
        change_summary: Option<&str>,
        created_by: Option<DbId>,
    ) -> Result<Option<NewsletterVersion>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(latest) = Self::lock_newsletter(&mut tx, newsletter_id).await? else {
            return Ok(None);
        };

        let version = Self::append(
            &mut tx,
            newsletter_id,
            next_version_number(latest),
            document,
            change_summary,
            created_by,
        )
        .await?;

        tx.commit().await?;
        Ok(Some(version))
    }

    /// Copy version `version_id` forward as a new version and make it current.
    ///
    /// Returns `None` if the newsletter does not exist or the version does
    /// not belong to it. History is never rewritten.
    pub async fn restore(
        pool: &PgPool,
        newsletter_id: DbId,
        version_id: DbId,
        change_summary: Option<&str>,
        created_by: Option<DbId>,
    ) -> Result<Option<NewsletterVersion>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(latest) = Self::lock_newsletter(&mut tx, newsletter_id).await? else {
            return Ok(None);
        };

        let query = format!("SELECT {COLUMNS} FROM newsletter_versions WHERE id = $1");
        let Some(source) = sqlx::query_as::<_, NewsletterVersion>(&query)
            .bind(version_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let Ok(plan) = plan_restore(
            newsletter_id,
            source.version_ref(),
            latest.unwrap_or(0),
            change_summary,
        ) else {
            return Ok(None);
        };

        let version = Self::append(
            &mut tx,
            newsletter_id,
            plan.version_number,
            &source.content,
            Some(&plan.change_summary),
            created_by,
        )
        .await?;

        tx.commit().await?;
        Ok(Some(version))
    }

    /// List a newsletter's versions, newest first, without content.
    pub async fn list_by_newsletter(
        pool: &PgPool,
        newsletter_id: DbId,
    ) -> Result<Vec<NewsletterVersionSummary>, sqlx::Error> {
        sqlx::query_as::<_, NewsletterVersionSummary>(
            "SELECT id, newsletter_id, version_number, change_summary, created_by, created_at
             FROM newsletter_versions
             WHERE newsletter_id = $1
             ORDER BY version_number DESC",
        )
        .bind(newsletter_id)
        .fetch_all(pool)
        .await
    }

    /// Find a version, scoped to its newsletter.
    pub async fn find_for_newsletter(
        pool: &PgPool,
        newsletter_id: DbId,
        version_id: DbId,
    ) -> Result<Option<NewsletterVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM newsletter_versions WHERE id = $1 AND newsletter_id = $2"
        );
        sqlx::query_as::<_, NewsletterVersion>(&query)
            .bind(version_id)
            .bind(newsletter_id)
            .fetch_optional(pool)
            .await
    }

    /// Lock the newsletter row and read its highest version number.
    ///
    /// Outer `None`: the newsletter does not exist.
    async fn lock_newsletter(
        tx: &mut Transaction<'_, Postgres>,
        newsletter_id: DbId,
    ) -> Result<Option<Option<i32>>, sqlx::Error> {
        let locked: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM newsletters WHERE id = $1 FOR UPDATE")
                .bind(newsletter_id)
                .fetch_optional(&mut **tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let latest: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(version_number) FROM newsletter_versions WHERE newsletter_id = $1",
        )
        .bind(newsletter_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(Some(latest))
    }

    /// Insert a version and point the newsletter's working document at it.
    async fn append(
        tx: &mut Transaction<'_, Postgres>,
        newsletter_id: DbId,
        version_number: i32,
        content: &serde_json::Value,
        change_summary: Option<&str>,
        created_by: Option<DbId>,
    ) -> Result<NewsletterVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO newsletter_versions
                (newsletter_id, version_number, content, change_summary, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let version = sqlx::query_as::<_, NewsletterVersion>(&query)
            .bind(newsletter_id)
            .bind(version_number)
            .bind(content)
            .bind(change_summary)
            .bind(created_by)
            .fetch_one(&mut **tx)
            .await?;

        sqlx::query("UPDATE newsletters SET document = $2, current_version_id = $3 WHERE id = $1")
            .bind(newsletter_id)
            .bind(content)
            .bind(version.id)
            .execute(&mut **tx)
            .await?;

        Ok(version)
    }
}
