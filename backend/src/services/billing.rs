//! Billing service: invoice generation and payments
//!
//! An invoice freezes the cost aggregator's output for a completed work
//! order. Once issued it is never recomputed; later part or labor changes
//! on the order do not touch it.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::costing::aggregate_cost;
use shared::{
    format_invoice_number, validate_amount, Invoice, InvoiceState, Payment, PaymentMethod,
};

/// Billing service
#[derive(Clone)]
pub struct BillingService {
    db: PgPool,
}

/// Database row for an invoice
#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    number: String,
    work_order_id: Uuid,
    client_id: Option<Uuid>,
    vehicle_id: Uuid,
    issued_by: Uuid,
    total: Decimal,
    estado: String,
    issued_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_model(self) -> AppResult<Invoice> {
        let estado = InvoiceState::from_str(&self.estado)
            .ok_or_else(|| AppError::Internal(format!("unknown invoice state: {}", self.estado)))?;
        Ok(Invoice {
            id: self.id,
            number: self.number,
            work_order_id: self.work_order_id,
            client_id: self.client_id,
            vehicle_id: self.vehicle_id,
            issued_by: self.issued_by,
            total: self.total,
            estado,
            issued_at: self.issued_at,
            created_at: self.created_at,
        })
    }
}

const INVOICE_COLUMNS: &str =
    "id, number, work_order_id, client_id, vehicle_id, issued_by, total, estado, issued_at, created_at";

/// Input for registering a payment
#[derive(Debug, Deserialize)]
pub struct AddPaymentInput {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
}

/// Invoice with its payments and outstanding balance
#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub payments: Vec<Payment>,
    pub paid: Decimal,
    pub outstanding: Decimal,
}

impl BillingService {
    /// Create a new BillingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Issue the invoice for a completed work order.
    ///
    /// The total is read from the cost aggregator inside the same
    /// transaction that persists the invoice, so the frozen figure is
    /// exactly what was owed at issue time. The number is sequential per
    /// year: F<year><seq>.
    pub async fn generate_invoice(&self, order_id: Uuid, actor: Uuid) -> AppResult<Invoice> {
        let mut tx = self.db.begin().await?;

        let order = sqlx::query_as::<_, (String, Option<Uuid>, Uuid)>(
            "SELECT estado, client_id, vehicle_id FROM work_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Work order".to_string()))?;

        if order.0 != "completado" {
            return Err(AppError::ServiceNotCompleted(order_id.to_string()));
        }

        let already_invoiced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM invoices WHERE work_order_id = $1 AND estado <> 'anulada')",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        if already_invoiced {
            return Err(AppError::AlreadyInvoiced(order_id.to_string()));
        }

        let cost = aggregate_cost(&mut *tx, order_id).await?;

        let now = Utc::now();
        let year = now.year();

        // Sequence within the year; the numbering table is serialized by
        // the advisory lock so two issuers cannot take the same number.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(i64::from(year))
            .execute(&mut *tx)
            .await?;

        let issued_this_year = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM invoices WHERE date_part('year', issued_at) = $1",
        )
        .bind(f64::from(year))
        .fetch_one(&mut *tx)
        .await?;

        let number = format_invoice_number(year, issued_this_year + 1);

        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            INSERT INTO invoices (number, work_order_id, client_id, vehicle_id, issued_by, total, estado, issued_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'pendiente', $7)
            RETURNING {INVOICE_COLUMNS}
            "#,
        ))
        .bind(&number)
        .bind(order_id)
        .bind(order.1)
        .bind(order.2)
        .bind(actor)
        .bind(cost.total_cost)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %order_id, number = %number, total = %cost.total_cost, "invoice issued");

        row.into_model()
    }

    /// Register a payment against an invoice. The running sum of
    /// payments can never exceed the frozen total; reaching it flips the
    /// invoice to `pagada`.
    pub async fn add_payment(&self, invoice_id: Uuid, input: AddPaymentInput) -> AppResult<Payment> {
        if let Err(msg) = validate_amount(input.amount) {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: msg.to_string(),
                message_es: "El monto debe ser positivo".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let invoice = sqlx::query_as::<_, (Decimal, String)>(
            "SELECT total, estado FROM invoices WHERE id = $1 FOR UPDATE",
        )
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        if invoice.1 == "anulada" {
            return Err(AppError::Conflict {
                resource: "invoice".to_string(),
                message: "Cannot register payments on a voided invoice".to_string(),
                message_es: "No se pueden registrar pagos sobre una factura anulada".to_string(),
            });
        }

        let paid = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT SUM(amount) FROM payments WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await?
        .unwrap_or(Decimal::ZERO);

        let outstanding = invoice.0 - paid;
        if input.amount > outstanding {
            return Err(AppError::OverPayment {
                amount: input.amount,
                outstanding,
            });
        }

        let now = Utc::now();
        let payment = sqlx::query_as::<_, (Uuid, Uuid, Decimal, String, Option<String>, DateTime<Utc>, DateTime<Utc>)>(
            r#"
            INSERT INTO payments (invoice_id, amount, method, reference, paid_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, invoice_id, amount, method, reference, paid_at, created_at
            "#,
        )
        .bind(invoice_id)
        .bind(input.amount)
        .bind(input.method.as_str())
        .bind(&input.reference)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        if paid + input.amount == invoice.0 {
            sqlx::query("UPDATE invoices SET estado = 'pagada' WHERE id = $1")
                .bind(invoice_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let method = PaymentMethod::from_str(&payment.3)
            .ok_or_else(|| AppError::Internal(format!("unknown payment method: {}", payment.3)))?;

        Ok(Payment {
            id: payment.0,
            invoice_id: payment.1,
            amount: payment.2,
            method,
            reference: payment.4,
            paid_at: payment.5,
            created_at: payment.6,
        })
    }

    /// Void an invoice. Only possible while no payments exist; voiding
    /// is what permits reopening the underlying work order.
    pub async fn void_invoice(&self, invoice_id: Uuid) -> AppResult<Invoice> {
        let mut tx = self.db.begin().await?;

        let estado = sqlx::query_scalar::<_, String>(
            "SELECT estado FROM invoices WHERE id = $1 FOR UPDATE",
        )
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        if estado == "anulada" {
            return Err(AppError::Conflict {
                resource: "invoice".to_string(),
                message: "Invoice is already voided".to_string(),
                message_es: "La factura ya está anulada".to_string(),
            });
        }

        let has_payments = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM payments WHERE invoice_id = $1)",
        )
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await?;

        if has_payments {
            return Err(AppError::Conflict {
                resource: "invoice".to_string(),
                message: "Cannot void an invoice that has payments".to_string(),
                message_es: "No se puede anular una factura con pagos registrados".to_string(),
            });
        }

        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            UPDATE invoices SET estado = 'anulada' WHERE id = $1
            RETURNING {INVOICE_COLUMNS}
            "#,
        ))
        .bind(invoice_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(invoice_id = %invoice_id, "invoice voided");

        row.into_model()
    }

    /// Fetch an invoice with payments and outstanding balance
    pub async fn get_invoice(&self, invoice_id: Uuid) -> AppResult<InvoiceDetail> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1",
        ))
        .bind(invoice_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice".to_string()))?;

        let invoice = row.into_model()?;
        let payments = self.list_payments(invoice_id).await?;
        let paid: Decimal = payments.iter().map(|p| p.amount).sum();

        Ok(InvoiceDetail {
            paid,
            outstanding: invoice.total - paid,
            invoice,
            payments,
        })
    }

    /// List invoices, newest first
    pub async fn list_invoices(&self) -> AppResult<Vec<Invoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY issued_at DESC",
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(InvoiceRow::into_model).collect()
    }

    /// Payments for an invoice, oldest first
    pub async fn list_payments(&self, invoice_id: Uuid) -> AppResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, Decimal, String, Option<String>, DateTime<Utc>, DateTime<Utc>)>(
            r#"
            SELECT id, invoice_id, amount, method, reference, paid_at, created_at
            FROM payments
            WHERE invoice_id = $1
            ORDER BY paid_at ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|r| {
                let method = PaymentMethod::from_str(&r.3)
                    .ok_or_else(|| AppError::Internal(format!("unknown payment method: {}", r.3)))?;
                Ok(Payment {
                    id: r.0,
                    invoice_id: r.1,
                    amount: r.2,
                    method,
                    reference: r.4,
                    paid_at: r.5,
                    created_at: r.6,
                })
            })
            .collect()
    }
}
