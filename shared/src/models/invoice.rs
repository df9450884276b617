//! Invoices and payments

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Invoice settlement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceState {
    Pendiente,
    Pagada,
    Anulada,
}

impl InvoiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceState::Pendiente => "pendiente",
            InvoiceState::Pagada => "pagada",
            InvoiceState::Anulada => "anulada",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pendiente" => Some(InvoiceState::Pendiente),
            "pagada" => Some(InvoiceState::Pagada),
            "anulada" => Some(InvoiceState::Anulada),
            _ => None,
        }
    }
}

/// Immutable financial snapshot issued once a work order completes.
/// The total is frozen at generation time and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub number: String,
    pub work_order_id: Uuid,
    pub client_id: Option<Uuid>,
    pub vehicle_id: Uuid,
    pub issued_by: Uuid,
    pub total: Decimal,
    pub estado: InvoiceState,
    pub issued_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Format a sequential invoice number: F<year><zero-padded sequence>,
/// e.g. the first invoice of 2026 is `F20260001`.
pub fn format_invoice_number(year: i32, sequence: i64) -> String {
    format!("F{}{:04}", year, sequence)
}

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Efectivo,
    Tarjeta,
    Transferencia,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "efectivo",
            PaymentMethod::Tarjeta => "tarjeta",
            PaymentMethod::Transferencia => "transferencia",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "efectivo" => Some(PaymentMethod::Efectivo),
            "tarjeta" => Some(PaymentMethod::Tarjeta),
            "transferencia" => Some(PaymentMethod::Transferencia),
            _ => None,
        }
    }
}

/// A partial or full settlement against an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub paid_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_number_format() {
        assert_eq!(format_invoice_number(2026, 1), "F20260001");
        assert_eq!(format_invoice_number(2026, 42), "F20260042");
        assert_eq!(format_invoice_number(2025, 9999), "F20259999");
        // sequence keeps growing past the pad width rather than wrapping
        assert_eq!(format_invoice_number(2026, 10001), "F202610001");
    }

    #[test]
    fn invoice_state_round_trip() {
        for s in [
            InvoiceState::Pendiente,
            InvoiceState::Pagada,
            InvoiceState::Anulada,
        ] {
            assert_eq!(InvoiceState::from_str(s.as_str()), Some(s));
        }
        assert_eq!(InvoiceState::from_str("vencida"), None);
    }

    #[test]
    fn payment_method_round_trip() {
        for m in [
            PaymentMethod::Efectivo,
            PaymentMethod::Tarjeta,
            PaymentMethod::Transferencia,
        ] {
            assert_eq!(PaymentMethod::from_str(m.as_str()), Some(m));
        }
    }
}
