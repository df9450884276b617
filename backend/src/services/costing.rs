//! Cost aggregation for work orders
//!
//! Read-only derivation of a work order's running cost: consumed parts at
//! sale price plus logged labor at each mechanic's hourly rate. Nothing is
//! persisted here; the billing service freezes the result into an invoice.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::AppResult;

/// Breakdown of a work order's current cost
#[derive(Debug, Clone, Serialize)]
pub struct CostBreakdown {
    pub work_order_id: Uuid,
    pub parts_cost: Decimal,
    pub labor_cost: Decimal,
    pub total_cost: Decimal,
}

/// Compute the current cost of a work order.
///
/// Parts: `salida` movements with category `consumo` that have not been
/// reversed, valued at the part's sale price. Adjustment rows document
/// edits and carry no value of their own; returned parts drop out via the
/// `reversed` flag. Labor: hours times the mechanic's hourly rate.
///
/// Callable both on a pooled connection and inside an open transaction,
/// so invoice generation reads the same numbers it freezes.
pub async fn aggregate_cost(
    conn: &mut PgConnection,
    work_order_id: Uuid,
) -> AppResult<CostBreakdown> {
    let parts_cost = sqlx::query_scalar::<_, Option<Decimal>>(
        r#"
        SELECT SUM(m.quantity * p.sale_price)
        FROM inventory_movements m
        JOIN parts p ON p.id = m.part_id
        WHERE m.work_order_id = $1
          AND m.movement_type = 'salida'
          AND m.category = 'consumo'
          AND m.reversed = false
        "#,
    )
    .bind(work_order_id)
    .fetch_one(&mut *conn)
    .await?
    .unwrap_or(Decimal::ZERO);

    let labor_cost = sqlx::query_scalar::<_, Option<Decimal>>(
        r#"
        SELECT SUM(le.hours * mec.hourly_rate)
        FROM labor_entries le
        JOIN mechanics mec ON mec.id = le.mechanic_id
        WHERE le.work_order_id = $1
        "#,
    )
    .bind(work_order_id)
    .fetch_one(&mut *conn)
    .await?
    .unwrap_or(Decimal::ZERO);

    Ok(CostBreakdown {
        work_order_id,
        parts_cost,
        labor_cost,
        total_cost: parts_cost + labor_cost,
    })
}
