//! Inventory ledger service
//!
//! Append-only stock movements tied to parts and work orders. Stock on a
//! part is only ever changed here, together with the movement that
//! explains the change, inside one transaction. Decrements use a
//! conditional update so two concurrent consumers can never drive stock
//! negative.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::notification;
use shared::{validate_quantity, InventoryMovement, MovementCategory, MovementType};

/// Inventory service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Database row for a movement
#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id: Uuid,
    part_id: Uuid,
    movement_type: String,
    category: String,
    quantity: i32,
    work_order_id: Option<Uuid>,
    reversed: bool,
    reverses: Option<Uuid>,
    note: Option<String>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl MovementRow {
    fn into_model(self) -> AppResult<InventoryMovement> {
        let movement_type = MovementType::from_str(&self.movement_type).ok_or_else(|| {
            AppError::Internal(format!("unknown movement type: {}", self.movement_type))
        })?;
        let category = MovementCategory::from_str(&self.category)
            .ok_or_else(|| AppError::Internal(format!("unknown movement category: {}", self.category)))?;
        Ok(InventoryMovement {
            id: self.id,
            part_id: self.part_id,
            movement_type,
            category,
            quantity: self.quantity,
            work_order_id: self.work_order_id,
            reversed: self.reversed,
            reverses: self.reverses,
            note: self.note,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

const MOVEMENT_COLUMNS: &str = "id, part_id, movement_type, category, quantity, work_order_id, \
     reversed, reverses, note, created_by, created_at";

/// Ledger reconciliation for a part: the recorded stock against the
/// balance implied by the movement history
#[derive(Debug, Serialize)]
pub struct StockReconciliation {
    pub part_id: Uuid,
    pub recorded_stock: i32,
    pub ledger_balance: i64,
    pub consistent: bool,
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Consume a part on a work order: one `salida` movement and the
    /// matching stock decrement, committed together.
    pub async fn consume_part(
        &self,
        order_id: Uuid,
        part_id: Uuid,
        quantity: i32,
        actor: Uuid,
    ) -> AppResult<InventoryMovement> {
        if let Err(msg) = validate_quantity(quantity) {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
                message_es: "La cantidad debe ser positiva".to_string(),
            });
        }

        let order_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM work_orders WHERE id = $1)",
        )
        .bind(order_id)
        .fetch_one(&self.db)
        .await?;
        if !order_exists {
            return Err(AppError::NotFound("Work order".to_string()));
        }

        let mut tx = self.db.begin().await?;

        // Conditional decrement: fails the WHERE clause instead of racing
        // a concurrent consumer below zero.
        let updated = sqlx::query(
            "UPDATE parts SET stock = stock - $1, updated_at = NOW() WHERE id = $2 AND stock >= $1",
        )
        .bind(quantity)
        .bind(part_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let part = sqlx::query_as::<_, (String, i32)>(
                "SELECT code, stock FROM parts WHERE id = $1",
            )
            .bind(part_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Part".to_string()))?;

            return Err(AppError::InsufficientStock {
                part_code: part.0,
                requested: quantity,
                available: part.1,
            });
        }

        let row = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            INSERT INTO inventory_movements (part_id, movement_type, category, quantity, work_order_id, created_by)
            VALUES ($1, 'salida', 'consumo', $2, $3, $4)
            RETURNING {MOVEMENT_COLUMNS}
            "#,
        ))
        .bind(part_id)
        .bind(quantity)
        .bind(order_id)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        // Queue a low-stock notification while still inside the
        // transaction, so it only exists if the consumption commits.
        let part = sqlx::query_as::<_, (String, String, i32, i32)>(
            "SELECT code, name, stock, min_stock FROM parts WHERE id = $1",
        )
        .bind(part_id)
        .fetch_one(&mut *tx)
        .await?;

        if part.2 <= part.3 {
            notification::queue_low_stock(&mut tx, part_id, &part.0, &part.1, part.2, part.3).await?;
        }

        tx.commit().await?;

        tracing::info!(part_id = %part_id, order_id = %order_id, quantity, "part consumed");

        row.into_model()
    }

    /// Return a consumed part: a compensating `entrada` is appended and
    /// the original `salida` is flagged reversed, never deleted.
    pub async fn return_part(&self, order_id: Uuid, part_id: Uuid) -> AppResult<InventoryMovement> {
        let mut tx = self.db.begin().await?;

        let original = sqlx::query_as::<_, (Uuid, i32)>(
            r#"
            SELECT id, quantity FROM inventory_movements
            WHERE work_order_id = $1 AND part_id = $2
              AND movement_type = 'salida' AND category = 'consumo' AND reversed = false
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .bind(part_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::MovementNotFound(format!(
                "no active consumption of part {} on work order {}",
                part_id, order_id
            ))
        })?;

        sqlx::query("UPDATE inventory_movements SET reversed = true WHERE id = $1")
            .bind(original.0)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE parts SET stock = stock + $1, updated_at = NOW() WHERE id = $2")
            .bind(original.1)
            .bind(part_id)
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            INSERT INTO inventory_movements (part_id, movement_type, category, quantity, work_order_id, reverses)
            VALUES ($1, 'entrada', 'devolucion', $2, $3, $4)
            RETURNING {MOVEMENT_COLUMNS}
            "#,
        ))
        .bind(part_id)
        .bind(original.1)
        .bind(order_id)
        .bind(original.0)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(part_id = %part_id, order_id = %order_id, "part returned");

        row.into_model()
    }

    /// Change the consumed quantity of a part on an order. The original
    /// consumption row is updated to the new quantity and one `ajuste`
    /// movement documents the delta applied to stock.
    pub async fn adjust_quantity(
        &self,
        order_id: Uuid,
        part_id: Uuid,
        new_quantity: i32,
    ) -> AppResult<InventoryMovement> {
        if let Err(msg) = validate_quantity(new_quantity) {
            return Err(AppError::Validation {
                field: "new_quantity".to_string(),
                message: msg.to_string(),
                message_es: "La cantidad debe ser positiva".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let original = sqlx::query_as::<_, (Uuid, i32)>(
            r#"
            SELECT id, quantity FROM inventory_movements
            WHERE work_order_id = $1 AND part_id = $2
              AND movement_type = 'salida' AND category = 'consumo' AND reversed = false
            ORDER BY created_at DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(order_id)
        .bind(part_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::MovementNotFound(format!(
                "no active consumption of part {} on work order {}",
                part_id, order_id
            ))
        })?;

        let delta = new_quantity - original.1;

        if delta > 0 {
            let updated = sqlx::query(
                "UPDATE parts SET stock = stock - $1, updated_at = NOW() WHERE id = $2 AND stock >= $1",
            )
            .bind(delta)
            .bind(part_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                let part = sqlx::query_as::<_, (String, i32)>(
                    "SELECT code, stock FROM parts WHERE id = $1",
                )
                .bind(part_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Part".to_string()))?;

                return Err(AppError::InsufficientStock {
                    part_code: part.0,
                    requested: delta,
                    available: part.1,
                });
            }
        } else if delta < 0 {
            sqlx::query("UPDATE parts SET stock = stock + $1, updated_at = NOW() WHERE id = $2")
                .bind(-delta)
                .bind(part_id)
                .execute(&mut *tx)
                .await?;
        } else {
            // Nothing to change; return the movement as-is
            let row = sqlx::query_as::<_, MovementRow>(&format!(
                "SELECT {MOVEMENT_COLUMNS} FROM inventory_movements WHERE id = $1",
            ))
            .bind(original.0)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            return row.into_model();
        }

        let (adj_type, adj_qty) = if delta > 0 {
            ("salida", delta)
        } else {
            ("entrada", -delta)
        };

        sqlx::query(
            r#"
            INSERT INTO inventory_movements (part_id, movement_type, category, quantity, work_order_id, note)
            VALUES ($1, $2, 'ajuste', $3, $4, $5)
            "#,
        )
        .bind(part_id)
        .bind(adj_type)
        .bind(adj_qty)
        .bind(order_id)
        .bind(format!("quantity adjusted {} -> {}", original.1, new_quantity))
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            UPDATE inventory_movements SET quantity = $1 WHERE id = $2
            RETURNING {MOVEMENT_COLUMNS}
            "#,
        ))
        .bind(new_quantity)
        .bind(original.0)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.into_model()
    }

    /// Receive purchased stock: an `entrada` movement with the matching
    /// stock increment.
    pub async fn restock(
        &self,
        part_id: Uuid,
        quantity: i32,
        actor: Uuid,
        note: Option<String>,
    ) -> AppResult<InventoryMovement> {
        if let Err(msg) = validate_quantity(quantity) {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: msg.to_string(),
                message_es: "La cantidad debe ser positiva".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let updated = sqlx::query(
            "UPDATE parts SET stock = stock + $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(quantity)
        .bind(part_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Part".to_string()));
        }

        let row = sqlx::query_as::<_, MovementRow>(&format!(
            r#"
            INSERT INTO inventory_movements (part_id, movement_type, category, quantity, note, created_by)
            VALUES ($1, 'entrada', 'compra', $2, $3, $4)
            RETURNING {MOVEMENT_COLUMNS}
            "#,
        ))
        .bind(part_id)
        .bind(quantity)
        .bind(&note)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.into_model()
    }

    /// Movement history for a part, newest first
    pub async fn list_movements_for_part(&self, part_id: Uuid) -> AppResult<Vec<InventoryMovement>> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM parts WHERE id = $1)")
            .bind(part_id)
            .fetch_one(&self.db)
            .await?;
        if !exists {
            return Err(AppError::NotFound("Part".to_string()));
        }

        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM inventory_movements WHERE part_id = $1 ORDER BY created_at DESC",
        ))
        .bind(part_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(MovementRow::into_model).collect()
    }

    /// Movement history for a work order, oldest first
    pub async fn list_movements_for_order(&self, order_id: Uuid) -> AppResult<Vec<InventoryMovement>> {
        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM inventory_movements WHERE work_order_id = $1 ORDER BY created_at ASC",
        ))
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(MovementRow::into_model).collect()
    }

    /// Check a part's recorded stock against its ledger. Adjustment rows
    /// document edits to earlier movements, so they are excluded; the
    /// edited rows already carry their corrected quantities.
    pub async fn reconcile_stock(&self, part_id: Uuid) -> AppResult<StockReconciliation> {
        let recorded = sqlx::query_scalar::<_, i32>("SELECT stock FROM parts WHERE id = $1")
            .bind(part_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Part".to_string()))?;

        let ledger_balance = sqlx::query_scalar::<_, Option<i64>>(
            r#"
            SELECT SUM(CASE WHEN movement_type = 'entrada' THEN quantity ELSE -quantity END)
            FROM inventory_movements
            WHERE part_id = $1 AND category <> 'ajuste'
            "#,
        )
        .bind(part_id)
        .fetch_one(&self.db)
        .await?
        .unwrap_or(0);

        Ok(StockReconciliation {
            part_id,
            recorded_stock: recorded,
            ledger_balance,
            consistent: i64::from(recorded) == ledger_balance,
        })
    }
}
