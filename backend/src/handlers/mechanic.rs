//! HTTP handlers for mechanic management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::mechanic::{CreateMechanicInput, UpdateMechanicInput};
use crate::services::MechanicService;
use crate::AppState;
use shared::Mechanic;

/// Register a mechanic
pub async fn create_mechanic(
    State(state): State<AppState>,
    Json(input): Json<CreateMechanicInput>,
) -> AppResult<(StatusCode, Json<Mechanic>)> {
    let service = MechanicService::new(state.db);
    let mechanic = service.create_mechanic(input).await?;
    Ok((StatusCode::CREATED, Json(mechanic)))
}

/// List mechanics
pub async fn list_mechanics(State(state): State<AppState>) -> AppResult<Json<Vec<Mechanic>>> {
    let service = MechanicService::new(state.db);
    let mechanics = service.list_mechanics().await?;
    Ok(Json(mechanics))
}

/// Get a mechanic
pub async fn get_mechanic(
    State(state): State<AppState>,
    Path(mechanic_id): Path<Uuid>,
) -> AppResult<Json<Mechanic>> {
    let service = MechanicService::new(state.db);
    let mechanic = service.get_mechanic(mechanic_id).await?;
    Ok(Json(mechanic))
}

/// Update a mechanic
pub async fn update_mechanic(
    State(state): State<AppState>,
    Path(mechanic_id): Path<Uuid>,
    Json(input): Json<UpdateMechanicInput>,
) -> AppResult<Json<Mechanic>> {
    let service = MechanicService::new(state.db);
    let mechanic = service.update_mechanic(mechanic_id, input).await?;
    Ok(Json(mechanic))
}

/// Delete or deactivate a mechanic
pub async fn delete_mechanic(
    State(state): State<AppState>,
    Path(mechanic_id): Path<Uuid>,
) -> AppResult<Json<Mechanic>> {
    let service = MechanicService::new(state.db);
    let mechanic = service.delete_mechanic(mechanic_id).await?;
    Ok(Json(mechanic))
}
