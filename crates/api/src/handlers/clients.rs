//! Handlers for the `/clients` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pressroom_core::error::CoreError;
use pressroom_core::types::DbId;
use pressroom_db::models::client::{Client, CreateClient, UpdateClient};
use pressroom_db::repositories::ClientRepo;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a client or fail with 404. Used by every client-scoped handler.
pub(crate) async fn ensure_client_exists(pool: &PgPool, client_id: DbId) -> AppResult<Client> {
    ClientRepo::find_by_id(pool, client_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Client",
            id: client_id,
        }))
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Client name must not be empty".into(),
        )));
    }
    Ok(name.to_string())
}

/// POST /api/v1/clients
///
/// Also creates the client's default `All` segment.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateClient>,
) -> AppResult<(StatusCode, Json<DataResponse<Client>>)> {
    let input = CreateClient {
        name: validate_name(&input.name)?,
    };
    let client = ClientRepo::create(&state.pool, &input).await?;
    tracing::info!(client_id = client.id, "Client created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: client })))
}

/// GET /api/v1/clients
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Client>>>> {
    let clients = ClientRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: clients }))
}

/// GET /api/v1/clients/{client_id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Client>>> {
    let client = ensure_client_exists(&state.pool, client_id).await?;
    Ok(Json(DataResponse { data: client }))
}

/// PUT /api/v1/clients/{client_id}
pub async fn update(
    State(state): State<AppState>,
    Path(client_id): Path<DbId>,
    Json(input): Json<UpdateClient>,
) -> AppResult<Json<DataResponse<Client>>> {
    let input = UpdateClient {
        name: input.name.as_deref().map(validate_name).transpose()?,
    };
    let client = ClientRepo::update(&state.pool, client_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Client",
            id: client_id,
        }))?;
    Ok(Json(DataResponse { data: client }))
}
