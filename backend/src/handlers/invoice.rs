//! HTTP handlers for billing endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::billing::{AddPaymentInput, InvoiceDetail};
use crate::services::BillingService;
use crate::AppState;
use shared::{Invoice, Payment};

#[derive(Deserialize)]
pub struct GenerateInvoiceRequest {
    pub work_order_id: Uuid,
}

/// Issue the invoice for a completed work order
pub async fn generate_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<GenerateInvoiceRequest>,
) -> AppResult<(StatusCode, Json<Invoice>)> {
    let service = BillingService::new(state.db);
    let invoice = service
        .generate_invoice(body.work_order_id, current_user.0.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// List invoices
pub async fn list_invoices(State(state): State<AppState>) -> AppResult<Json<Vec<Invoice>>> {
    let service = BillingService::new(state.db);
    let invoices = service.list_invoices().await?;
    Ok(Json(invoices))
}

/// Get an invoice with payments and outstanding balance
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<InvoiceDetail>> {
    let service = BillingService::new(state.db);
    let detail = service.get_invoice(invoice_id).await?;
    Ok(Json(detail))
}

/// Register a payment against an invoice
pub async fn add_payment(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(input): Json<AddPaymentInput>,
) -> AppResult<(StatusCode, Json<Payment>)> {
    let service = BillingService::new(state.db);
    let payment = service.add_payment(invoice_id, input).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// Payments for an invoice
pub async fn list_payments(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<Vec<Payment>>> {
    let service = BillingService::new(state.db);
    let payments = service.list_payments(invoice_id).await?;
    Ok(Json(payments))
}

/// Void an invoice. Admin only.
pub async fn void_invoice(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<Invoice>> {
    if !current_user.0.is_admin() {
        return Err(AppError::InsufficientPermissions);
    }

    let service = BillingService::new(state.db);
    let invoice = service.void_invoice(invoice_id).await?;
    Ok(Json(invoice))
}
