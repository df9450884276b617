//! HTTP handlers for work order endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::costing::CostBreakdown;
use crate::services::workorder::{
    ChangeStateInput, CreateOrderInput, DiagnosisInput, LogLaborInput, OrderDetail, OrderPart,
    ReadingsInput,
};
use crate::services::WorkOrderService;
use crate::AppState;
use shared::{LaborEntry, OrderState, PaginatedResponse, Pagination, StateHistoryEntry, WorkOrder};

#[derive(Deserialize)]
pub struct OrderListQuery {
    pub estado: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Open a work order
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<WorkOrder>)> {
    let service = WorkOrderService::new(state.db);
    let order = service.create_order(current_user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List work orders, optionally filtered by state
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<PaginatedResponse<WorkOrder>>> {
    let estado = match query.estado {
        Some(s) => Some(OrderState::from_str(&s).ok_or(AppError::InvalidState(s))?),
        None => None,
    };

    let default = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(default.page),
        per_page: query.per_page.unwrap_or(default.per_page),
    };

    let service = WorkOrderService::new(state.db);
    let orders = service.list_orders(estado, pagination).await?;
    Ok(Json(orders))
}

/// Get a work order with history, parts, labor, and running cost
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderDetail>> {
    let service = WorkOrderService::new(state.db);
    let detail = service.get_order_detail(order_id).await?;
    Ok(Json(detail))
}

/// Transition a work order to a new state
pub async fn change_state(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(input): Json<ChangeStateInput>,
) -> AppResult<Json<WorkOrder>> {
    let service = WorkOrderService::new(state.db);
    let order = service
        .change_state(order_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(order))
}

/// State transition history for a work order
pub async fn get_state_history(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Vec<StateHistoryEntry>>> {
    let service = WorkOrderService::new(state.db);
    let history = service.get_state_history(order_id).await?;
    Ok(Json(history))
}

/// Record or amend the diagnosis
pub async fn record_diagnosis(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<DiagnosisInput>,
) -> AppResult<Json<WorkOrder>> {
    let service = WorkOrderService::new(state.db);
    let order = service.record_diagnosis(order_id, input).await?;
    Ok(Json(order))
}

/// Record return readings
pub async fn record_readings(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<ReadingsInput>,
) -> AppResult<Json<WorkOrder>> {
    let service = WorkOrderService::new(state.db);
    let order = service.record_readings(order_id, input).await?;
    Ok(Json(order))
}

/// Delete a work order
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = WorkOrderService::new(state.db);
    service.delete_order(order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Log mechanic hours against a work order
pub async fn log_labor(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<LogLaborInput>,
) -> AppResult<(StatusCode, Json<LaborEntry>)> {
    let service = WorkOrderService::new(state.db);
    let entry = service.log_labor(order_id, input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Labor entries for a work order
pub async fn list_labor(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Vec<LaborEntry>>> {
    let service = WorkOrderService::new(state.db);
    let labor = service.list_labor(order_id).await?;
    Ok(Json(labor))
}

/// Remove a labor entry
pub async fn delete_labor_entry(
    State(state): State<AppState>,
    Path((order_id, entry_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    let service = WorkOrderService::new(state.db);
    service.delete_labor_entry(order_id, entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Parts consumed by a work order
pub async fn get_order_parts(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Vec<OrderPart>>> {
    let service = WorkOrderService::new(state.db);
    let parts = service.get_order_parts(order_id).await?;
    Ok(Json(parts))
}

/// Current cost of a work order
pub async fn get_order_cost(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<CostBreakdown>> {
    let service = WorkOrderService::new(state.db);
    let cost = service.compute_cost(order_id).await?;
    Ok(Json(cost))
}
