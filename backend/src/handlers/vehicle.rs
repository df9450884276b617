//! HTTP handlers for vehicle management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::vehicle::{CreateVehicleInput, UpdateVehicleInput};
use crate::services::VehicleService;
use crate::AppState;
use shared::Vehicle;

#[derive(Deserialize)]
pub struct VehicleListQuery {
    pub client_id: Option<Uuid>,
}

/// Register a vehicle
pub async fn create_vehicle(
    State(state): State<AppState>,
    Json(input): Json<CreateVehicleInput>,
) -> AppResult<(StatusCode, Json<Vehicle>)> {
    let service = VehicleService::new(state.db);
    let vehicle = service.create_vehicle(input).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

/// List vehicles, optionally filtered by client
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<VehicleListQuery>,
) -> AppResult<Json<Vec<Vehicle>>> {
    let service = VehicleService::new(state.db);
    let vehicles = service.list_vehicles(query.client_id).await?;
    Ok(Json(vehicles))
}

/// Get a vehicle
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> AppResult<Json<Vehicle>> {
    let service = VehicleService::new(state.db);
    let vehicle = service.get_vehicle(vehicle_id).await?;
    Ok(Json(vehicle))
}

/// Update a vehicle
pub async fn update_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
    Json(input): Json<UpdateVehicleInput>,
) -> AppResult<Json<Vehicle>> {
    let service = VehicleService::new(state.db);
    let vehicle = service.update_vehicle(vehicle_id, input).await?;
    Ok(Json(vehicle))
}

/// Delete a vehicle
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = VehicleService::new(state.db);
    service.delete_vehicle(vehicle_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
