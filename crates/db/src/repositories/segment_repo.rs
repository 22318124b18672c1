//! Repository for the `segments` table.

use pressroom_core::types::DbId;
use sqlx::PgPool;

use crate::models::segment::{CreateSegment, Segment, UpdateSegment};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, client_id, name, tags, is_default, created_at, updated_at";

/// Provides CRUD operations for segments.
pub struct SegmentRepo;

impl SegmentRepo {
    /// Insert a segment. `input` must already be validated and normalised.
    pub async fn create(
        pool: &PgPool,
        client_id: DbId,
        input: &CreateSegment,
    ) -> Result<Segment, sqlx::Error> {
        let query = format!(
            "INSERT INTO segments (client_id, name, tags) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Segment>(&query)
            .bind(client_id)
            .bind(&input.name)
            .bind(&input.tags)
            .fetch_one(pool)
            .await
    }

    /// Create a single-tag segment named after `tag` unless the client
    /// already has a segment with that name. Returns `None` when skipped.
    pub async fn create_for_tag(
        pool: &PgPool,
        client_id: DbId,
        tag: &str,
    ) -> Result<Option<Segment>, sqlx::Error> {
        let query = format!(
            "INSERT INTO segments (client_id, name, tags) VALUES ($1, $2, ARRAY[$2])
             ON CONFLICT (client_id, lower(name)) DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Segment>(&query)
            .bind(client_id)
            .bind(tag)
            .fetch_optional(pool)
            .await
    }

    /// Find a segment of `client_id`.
    pub async fn find_by_id(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
    ) -> Result<Option<Segment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM segments WHERE id = $1 AND client_id = $2");
        sqlx::query_as::<_, Segment>(&query)
            .bind(id)
            .bind(client_id)
            .fetch_optional(pool)
            .await
    }

    /// List a client's segments, default first, then by name.
    pub async fn list(pool: &PgPool, client_id: DbId) -> Result<Vec<Segment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM segments WHERE client_id = $1
             ORDER BY is_default DESC, lower(name) ASC"
        );
        sqlx::query_as::<_, Segment>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Names of every segment the client has.
    pub async fn names_for_client(
        pool: &PgPool,
        client_id: DbId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT name FROM segments WHERE client_id = $1")
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Update a segment. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        client_id: DbId,
        id: DbId,
        input: &UpdateSegment,
    ) -> Result<Option<Segment>, sqlx::Error> {
        let query = format!(
            "UPDATE segments SET
                name = COALESCE($3, name),
                tags = COALESCE($4, tags)
             WHERE id = $1 AND client_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Segment>(&query)
            .bind(id)
            .bind(client_id)
            .bind(&input.name)
            .bind(&input.tags)
            .fetch_optional(pool)
            .await
    }

    /// Delete a non-default segment. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, client_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM segments WHERE id = $1 AND client_id = $2 AND NOT is_default",
        )
        .bind(id)
        .bind(client_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
