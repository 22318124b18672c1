//! Repository for the `clients` table.

use pressroom_core::segment::{default_segment_tags, DEFAULT_SEGMENT_NAME};
use pressroom_core::types::DbId;
use sqlx::PgPool;

use crate::models::client::{Client, CreateClient, UpdateClient};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, created_at, updated_at";

/// Provides CRUD operations for clients.
pub struct ClientRepo;

impl ClientRepo {
    /// Insert a new client together with its default `All` segment.
    pub async fn create(pool: &PgPool, input: &CreateClient) -> Result<Client, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("INSERT INTO clients (name) VALUES ($1) RETURNING {COLUMNS}");
        let client = sqlx::query_as::<_, Client>(&query)
            .bind(&input.name)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO segments (client_id, name, tags, is_default) VALUES ($1, $2, $3, true)",
        )
        .bind(client.id)
        .bind(DEFAULT_SEGMENT_NAME)
        .bind(default_segment_tags())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(client)
    }

    /// Find a client by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE id = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all clients alphabetically.
    pub async fn list(pool: &PgPool) -> Result<Vec<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients ORDER BY name ASC, id ASC");
        sqlx::query_as::<_, Client>(&query).fetch_all(pool).await
    }

    /// Update a client. Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateClient,
    ) -> Result<Option<Client>, sqlx::Error> {
        let query = format!(
            "UPDATE clients SET name = COALESCE($2, name) WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .bind(&input.name)
            .fetch_optional(pool)
            .await
    }
}
