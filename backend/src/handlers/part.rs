//! HTTP handlers for part catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::part::{CreatePartInput, UpdatePartInput};
use crate::services::PartService;
use crate::AppState;
use shared::Part;

#[derive(Deserialize)]
pub struct PartListQuery {
    #[serde(default)]
    pub low_stock: bool,
}

/// Create a part
pub async fn create_part(
    State(state): State<AppState>,
    Json(input): Json<CreatePartInput>,
) -> AppResult<(StatusCode, Json<Part>)> {
    let service = PartService::new(state.db);
    let part = service.create_part(input).await?;
    Ok((StatusCode::CREATED, Json(part)))
}

/// List parts; `?low_stock=true` restricts to parts at or below minimum
pub async fn list_parts(
    State(state): State<AppState>,
    Query(query): Query<PartListQuery>,
) -> AppResult<Json<Vec<Part>>> {
    let service = PartService::new(state.db);
    let parts = service.list_parts(query.low_stock).await?;
    Ok(Json(parts))
}

/// Get a part
pub async fn get_part(
    State(state): State<AppState>,
    Path(part_id): Path<Uuid>,
) -> AppResult<Json<Part>> {
    let service = PartService::new(state.db);
    let part = service.get_part(part_id).await?;
    Ok(Json(part))
}

/// Update a part
pub async fn update_part(
    State(state): State<AppState>,
    Path(part_id): Path<Uuid>,
    Json(input): Json<UpdatePartInput>,
) -> AppResult<Json<Part>> {
    let service = PartService::new(state.db);
    let part = service.update_part(part_id, input).await?;
    Ok(Json(part))
}

/// Delete a part
pub async fn delete_part(
    State(state): State<AppState>,
    Path(part_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = PartService::new(state.db);
    service.delete_part(part_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
