//! HTTP handlers for client management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::client::{CreateClientInput, UpdateClientInput};
use crate::services::ClientService;
use crate::AppState;
use shared::Client;

/// Create a client
pub async fn create_client(
    State(state): State<AppState>,
    Json(input): Json<CreateClientInput>,
) -> AppResult<(StatusCode, Json<Client>)> {
    let service = ClientService::new(state.db);
    let client = service.create_client(input).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// List all clients
pub async fn list_clients(State(state): State<AppState>) -> AppResult<Json<Vec<Client>>> {
    let service = ClientService::new(state.db);
    let clients = service.list_clients().await?;
    Ok(Json(clients))
}

/// Get a client
pub async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> AppResult<Json<Client>> {
    let service = ClientService::new(state.db);
    let client = service.get_client(client_id).await?;
    Ok(Json(client))
}

/// Update a client
pub async fn update_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(input): Json<UpdateClientInput>,
) -> AppResult<Json<Client>> {
    let service = ClientService::new(state.db);
    let client = service.update_client(client_id, input).await?;
    Ok(Json(client))
}

/// Delete a client
pub async fn delete_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = ClientService::new(state.db);
    service.delete_client(client_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
