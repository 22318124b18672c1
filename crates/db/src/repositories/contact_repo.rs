//! Repository for the `contacts` table.
//!
//! Lifecycle changes are single conditional statements on `archived_at`, so
//! two concurrent requests can never both apply the same transition. When a
//! statement matches no row the caller re-reads the contact to find out why.

use pressroom_core::import_commit::{ContactUpsert, UpsertOutcome};
use pressroom_core::types::DbId;
use sqlx::PgPool;

use crate::models::contact::{Contact, ContactView, CreateContact, UpdateContact};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, client_id, email, first_name, last_name, tags, is_active, \
    archived_at, created_at, updated_at";

/// Provides CRUD and lifecycle operations for contacts.
pub struct ContactRepo;

impl ContactRepo {
    /// Insert a contact added by hand. `input` must already be normalised.
    pub async fn create(
        pool: &PgPool,
        client_id: DbId,
        input: &CreateContact,
    ) -> Result<Contact, sqlx::Error> {
        let query = format!(
            "INSERT INTO contacts (client_id, email, first_name, last_name, tags)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Contact>(&query)
            .bind(client_id)
            .bind(&input.email)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.tags)
            .fetch_one(pool)
            .await
    }

    /// Find a contact of `client_id`, archived or not.
    pub async fn find_by_id(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
    ) -> Result<Option<Contact>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM contacts WHERE id = $1 AND client_id = $2");
        sqlx::query_as::<_, Contact>(&query)
            .bind(id)
            .bind(client_id)
            .fetch_optional(pool)
            .await
    }

    /// List a client's contacts in one lifecycle view, optionally limited to
    /// contacts carrying `tag`. Ordered by email.
    pub async fn list(
        pool: &PgPool,
        client_id: DbId,
        view: ContactView,
        tag: Option<&str>,
    ) -> Result<Vec<Contact>, sqlx::Error> {
        let lifecycle = match view {
            ContactView::All => "archived_at IS NULL",
            ContactView::Archived => "archived_at IS NOT NULL",
        };
        let query = format!(
            "SELECT {COLUMNS} FROM contacts
             WHERE client_id = $1 AND {lifecycle}
               AND ($2::TEXT IS NULL OR $2 = ANY(tags))
             ORDER BY email ASC"
        );
        sqlx::query_as::<_, Contact>(&query)
            .bind(client_id)
            .bind(tag)
            .fetch_all(pool)
            .await
    }

    /// Every email the client already has, archived contacts included.
    pub async fn emails_for_client(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT email FROM contacts WHERE client_id = $1")
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Update editable fields. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if the contact does not exist for this client.
    pub async fn update(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
        input: &UpdateContact,
    ) -> Result<Option<Contact>, sqlx::Error> {
        let query = format!(
            "UPDATE contacts SET
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                tags = COALESCE($5, tags),
                is_active = COALESCE($6, is_active)
             WHERE id = $1 AND client_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Contact>(&query)
            .bind(id)
            .bind(client_id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.tags)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Write one import upsert.
    ///
    /// New emails are inserted. Active contacts get non-empty names replaced
    /// and tags unioned in order. Archived contacts are left untouched: the
    /// conflict branch is guarded on `archived_at IS NULL`, so no row comes
    /// back and the outcome is [`UpsertOutcome::SkippedArchived`].
    pub async fn upsert_from_import(
        pool: &PgPool,
        client_id: DbId,
        upsert: &ContactUpsert,
    ) -> Result<UpsertOutcome, sqlx::Error> {
        let inserted: Option<bool> = sqlx::query_scalar(
            "INSERT INTO contacts AS c (client_id, email, first_name, last_name, tags)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (client_id, email) DO UPDATE SET
                first_name = CASE WHEN EXCLUDED.first_name <> '' THEN EXCLUDED.first_name ELSE c.first_name END,
                last_name = CASE WHEN EXCLUDED.last_name <> '' THEN EXCLUDED.last_name ELSE c.last_name END,
                tags = ARRAY(
                    SELECT t FROM unnest(c.tags || EXCLUDED.tags) WITH ORDINALITY AS u(t, n)
                    GROUP BY t ORDER BY MIN(n)
                )
             WHERE c.archived_at IS NULL
             RETURNING (xmax = 0)",
        )
        .bind(client_id)
        .bind(&upsert.email)
        .bind(&upsert.first_name)
        .bind(&upsert.last_name)
        .bind(&upsert.tags)
        .fetch_optional(pool)
        .await?;

        Ok(match inserted {
            Some(true) => UpsertOutcome::Inserted,
            Some(false) => UpsertOutcome::Updated,
            None => UpsertOutcome::SkippedArchived,
        })
    }

    /// Archive an active contact. Returns `None` if no active contact matched.
    pub async fn archive(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
    ) -> Result<Option<Contact>, sqlx::Error> {
        let query = format!(
            "UPDATE contacts SET archived_at = NOW()
             WHERE id = $1 AND client_id = $2 AND archived_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Contact>(&query)
            .bind(id)
            .bind(client_id)
            .fetch_optional(pool)
            .await
    }

    /// Restore an archived contact. Returns `None` if no archived contact matched.
    pub async fn restore(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
    ) -> Result<Option<Contact>, sqlx::Error> {
        let query = format!(
            "UPDATE contacts SET archived_at = NULL
             WHERE id = $1 AND client_id = $2 AND archived_at IS NOT NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Contact>(&query)
            .bind(id)
            .bind(client_id)
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete an archived contact. Returns `true` if a row was
    /// removed; active contacts are never matched.
    pub async fn delete_archived(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM contacts WHERE id = $1 AND client_id = $2 AND archived_at IS NOT NULL",
        )
        .bind(id)
        .bind(client_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
