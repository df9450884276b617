//! Error handling for AutoManager
//!
//! Provides consistent error responses in English and Spanish

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::OrderState;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Conflict: {message}")]
    Conflict {
        resource: String,
        message: String,
        message_es: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Work order lifecycle errors
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Illegal transition from {from} to {to}")]
    IllegalTransition {
        from: OrderState,
        to: OrderState,
        allowed: Vec<OrderState>,
    },

    // Inventory errors
    #[error("Insufficient stock for part {part_code}: requested {requested}, available {available}")]
    InsufficientStock {
        part_code: String,
        requested: i32,
        available: i32,
    },

    #[error("Movement not found: {0}")]
    MovementNotFound(String),

    // Billing errors
    #[error("Work order {0} is not completed")]
    ServiceNotCompleted(String),

    #[error("Work order {0} already has an invoice")]
    AlreadyInvoiced(String),

    #[error("Payment of {amount} exceeds outstanding balance of {outstanding}")]
    OverPayment {
        amount: rust_decimal::Decimal,
        outstanding: rust_decimal::Decimal,
    },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Permitted next states, populated for illegal transitions so the
    /// client can self-correct
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_states: Option<Vec<String>>,
}

impl ErrorDetail {
    fn new(code: &str, message_en: String, message_es: String) -> Self {
        Self {
            code: code.to_string(),
            message_en,
            message_es,
            field: None,
            allowed_states: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new(
                    "INVALID_CREDENTIALS",
                    "Invalid email or password".to_string(),
                    "Correo o contraseña incorrectos".to_string(),
                ),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new(
                    "TOKEN_EXPIRED",
                    "Token has expired".to_string(),
                    "El token ha expirado".to_string(),
                ),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new(
                    "INVALID_TOKEN",
                    "Invalid token".to_string(),
                    "Token inválido".to_string(),
                ),
            ),
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "INSUFFICIENT_PERMISSIONS",
                    "You do not have permission to perform this action".to_string(),
                    "No tiene permiso para realizar esta acción".to_string(),
                ),
            ),
            AppError::Validation {
                field,
                message,
                message_es,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new("VALIDATION_ERROR", message.clone(), message_es.clone())
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new(
                        "DUPLICATE_ENTRY",
                        format!("A record with this {} already exists", field),
                        format!("Ya existe un registro con este {}", field),
                    )
                },
            ),
            AppError::Conflict {
                resource,
                message,
                message_es,
            } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    field: Some(resource.clone()),
                    ..ErrorDetail::new("CONFLICT", message.clone(), message_es.clone())
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new(
                    "NOT_FOUND",
                    format!("{} not found", resource),
                    format!("No se encontró {}", resource),
                ),
            ),
            AppError::InvalidState(state) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "INVALID_STATE",
                    format!("'{}' is not a recognized work order state", state),
                    format!("'{}' no es un estado de servicio válido", state),
                ),
            ),
            AppError::IllegalTransition { from, to, allowed } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    allowed_states: Some(allowed.iter().map(|s| s.as_str().to_string()).collect()),
                    ..ErrorDetail::new(
                        "ILLEGAL_TRANSITION",
                        format!("Cannot move a work order from '{}' to '{}'", from, to),
                        format!("No se puede cambiar el servicio de '{}' a '{}'", from, to),
                    )
                },
            ),
            AppError::InsufficientStock {
                part_code,
                requested,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "INSUFFICIENT_STOCK",
                    format!(
                        "Insufficient stock for part {}: requested {}, available {}",
                        part_code, requested, available
                    ),
                    format!(
                        "Existencias insuficientes del repuesto {}: solicitadas {}, disponibles {}",
                        part_code, requested, available
                    ),
                ),
            ),
            AppError::MovementNotFound(detail) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new(
                    "MOVEMENT_NOT_FOUND",
                    format!("No inventory movement found: {}", detail),
                    format!("No se encontró el movimiento de inventario: {}", detail),
                ),
            ),
            AppError::ServiceNotCompleted(order) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "SERVICE_NOT_COMPLETED",
                    format!("Work order {} must be completed before invoicing", order),
                    format!("El servicio {} debe estar completado para facturar", order),
                ),
            ),
            AppError::AlreadyInvoiced(order) => (
                StatusCode::CONFLICT,
                ErrorDetail::new(
                    "ALREADY_INVOICED",
                    format!("Work order {} already has an invoice", order),
                    format!("El servicio {} ya tiene una factura emitida", order),
                ),
            ),
            AppError::OverPayment {
                amount,
                outstanding,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "OVER_PAYMENT",
                    format!(
                        "Payment of {} exceeds the outstanding balance of {}",
                        amount, outstanding
                    ),
                    format!(
                        "El pago de {} excede el saldo pendiente de {}",
                        amount, outstanding
                    ),
                ),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    "Ocurrió un error de base de datos".to_string(),
                ),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    msg.clone(),
                    "Ocurrió un error interno del servidor".to_string(),
                ),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    "Ocurrió un error interno del servidor".to_string(),
                ),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

impl From<shared::IllegalTransition> for AppError {
    fn from(err: shared::IllegalTransition) -> Self {
        AppError::IllegalTransition {
            from: err.from,
            to: err.to,
            allowed: err.allowed,
        }
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
