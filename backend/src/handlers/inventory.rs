//! HTTP handlers for inventory ledger endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inventory::StockReconciliation;
use crate::services::InventoryService;
use crate::AppState;
use shared::InventoryMovement;

#[derive(Deserialize)]
pub struct ConsumePartRequest {
    pub part_id: Uuid,
    pub quantity: i32,
}

#[derive(Deserialize)]
pub struct ReturnPartRequest {
    pub part_id: Uuid,
}

#[derive(Deserialize)]
pub struct AdjustQuantityRequest {
    pub part_id: Uuid,
    pub new_quantity: i32,
}

#[derive(Deserialize)]
pub struct RestockRequest {
    pub part_id: Uuid,
    pub quantity: i32,
    pub note: Option<String>,
}

/// Consume a part on a work order
pub async fn consume_part(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(body): Json<ConsumePartRequest>,
) -> AppResult<(StatusCode, Json<InventoryMovement>)> {
    let service = InventoryService::new(state.db);
    let movement = service
        .consume_part(order_id, body.part_id, body.quantity, current_user.0.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// Return a consumed part to stock
pub async fn return_part(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(body): Json<ReturnPartRequest>,
) -> AppResult<Json<InventoryMovement>> {
    let service = InventoryService::new(state.db);
    let movement = service.return_part(order_id, body.part_id).await?;
    Ok(Json(movement))
}

/// Adjust the consumed quantity of a part on a work order
pub async fn adjust_quantity(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(body): Json<AdjustQuantityRequest>,
) -> AppResult<Json<InventoryMovement>> {
    let service = InventoryService::new(state.db);
    let movement = service
        .adjust_quantity(order_id, body.part_id, body.new_quantity)
        .await?;
    Ok(Json(movement))
}

/// Receive purchased stock
pub async fn restock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<RestockRequest>,
) -> AppResult<(StatusCode, Json<InventoryMovement>)> {
    let service = InventoryService::new(state.db);
    let movement = service
        .restock(body.part_id, body.quantity, current_user.0.user_id, body.note)
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// Movement history for a part
pub async fn list_part_movements(
    State(state): State<AppState>,
    Path(part_id): Path<Uuid>,
) -> AppResult<Json<Vec<InventoryMovement>>> {
    let service = InventoryService::new(state.db);
    let movements = service.list_movements_for_part(part_id).await?;
    Ok(Json(movements))
}

/// Movement history for a work order
pub async fn list_order_movements(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Vec<InventoryMovement>>> {
    let service = InventoryService::new(state.db);
    let movements = service.list_movements_for_order(order_id).await?;
    Ok(Json(movements))
}

/// Reconcile a part's recorded stock against its ledger
pub async fn reconcile_stock(
    State(state): State<AppState>,
    Path(part_id): Path<Uuid>,
) -> AppResult<Json<StockReconciliation>> {
    let service = InventoryService::new(state.db);
    let reconciliation = service.reconcile_stock(part_id).await?;
    Ok(Json(reconciliation))
}
