//! Work order lifecycle service
//!
//! Owns the repair state machine: transition validation, state-history
//! auditing, labor logging, and the running cost estimate.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::costing::{aggregate_cost, CostBreakdown};
use shared::{
    validate_daily_hours, validate_hours, LaborEntry, OrderPriority, OrderState,
    PaginatedResponse, Pagination, PaginationMeta, StateHistoryEntry, WorkOrder,
};

/// Work order service
#[derive(Clone)]
pub struct WorkOrderService {
    db: PgPool,
}

/// Database row for a work order; `estado` is converted on the way out
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    description: String,
    estado: String,
    priority: String,
    vehicle_id: Uuid,
    client_id: Option<Uuid>,
    mechanic_id: Option<Uuid>,
    created_by: Uuid,
    diagnosis: Option<String>,
    recommendations: Option<String>,
    estimated_cost: Option<Decimal>,
    odometer_in: Option<i32>,
    odometer_out: Option<i32>,
    fuel_level_in: Option<i16>,
    fuel_level_out: Option<i16>,
    fecha_inicio: DateTime<Utc>,
    fecha_fin: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_model(self) -> AppResult<WorkOrder> {
        let estado = OrderState::from_str(&self.estado)
            .ok_or_else(|| AppError::Internal(format!("unknown state in database: {}", self.estado)))?;
        let priority = OrderPriority::from_str(&self.priority)
            .ok_or_else(|| AppError::Internal(format!("unknown priority in database: {}", self.priority)))?;
        Ok(WorkOrder {
            id: self.id,
            description: self.description,
            estado,
            priority,
            vehicle_id: self.vehicle_id,
            client_id: self.client_id,
            mechanic_id: self.mechanic_id,
            created_by: self.created_by,
            diagnosis: self.diagnosis,
            recommendations: self.recommendations,
            estimated_cost: self.estimated_cost,
            odometer_in: self.odometer_in,
            odometer_out: self.odometer_out,
            fuel_level_in: self.fuel_level_in,
            fuel_level_out: self.fuel_level_out,
            fecha_inicio: self.fecha_inicio,
            fecha_fin: self.fecha_fin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, description, estado, priority, vehicle_id, client_id, \
     mechanic_id, created_by, diagnosis, recommendations, estimated_cost, odometer_in, \
     odometer_out, fuel_level_in, fuel_level_out, fecha_inicio, fecha_fin, created_at, updated_at";

/// Input for opening a work order
#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub description: String,
    pub vehicle_id: Uuid,
    pub client_id: Option<Uuid>,
    pub mechanic_id: Option<Uuid>,
    pub priority: Option<OrderPriority>,
    pub estimated_cost: Option<Decimal>,
    pub odometer_in: Option<i32>,
    pub fuel_level_in: Option<i16>,
}

/// Input for a state transition
#[derive(Debug, Deserialize)]
pub struct ChangeStateInput {
    pub new_state: OrderState,
    pub comment: Option<String>,
}

/// Input for recording the diagnosis
#[derive(Debug, Deserialize)]
pub struct DiagnosisInput {
    pub diagnosis: Option<String>,
    pub recommendations: Option<String>,
    pub estimated_cost: Option<Decimal>,
}

/// Input for updating intake/return readings
#[derive(Debug, Deserialize)]
pub struct ReadingsInput {
    pub odometer_out: Option<i32>,
    pub fuel_level_out: Option<i16>,
}

/// Input for logging labor
#[derive(Debug, Deserialize)]
pub struct LogLaborInput {
    pub mechanic_id: Uuid,
    pub work_date: NaiveDate,
    pub hours: Decimal,
    pub note: Option<String>,
}

/// A consumed part as seen from a work order
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderPart {
    pub part_id: Uuid,
    pub code: String,
    pub name: String,
    pub quantity: i32,
    pub sale_price: Decimal,
}

/// Fully-materialized view of a work order: no lazy traversal, one snapshot
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: WorkOrder,
    pub history: Vec<StateHistoryEntry>,
    pub parts: Vec<OrderPart>,
    pub labor: Vec<LaborEntry>,
    pub cost: CostBreakdown,
}

impl WorkOrderService {
    /// Create a new WorkOrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Open a new work order in state `pendiente`
    pub async fn create_order(&self, created_by: Uuid, input: CreateOrderInput) -> AppResult<WorkOrder> {
        if input.description.trim().is_empty() {
            return Err(AppError::Validation {
                field: "description".to_string(),
                message: "Description cannot be empty".to_string(),
                message_es: "La descripción no puede estar vacía".to_string(),
            });
        }

        // Vehicle must exist; resolve its owner when no client is given
        let vehicle = sqlx::query_as::<_, (Uuid, Uuid)>(
            "SELECT id, client_id FROM vehicles WHERE id = $1",
        )
        .bind(input.vehicle_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle".to_string()))?;

        if let Some(mechanic_id) = input.mechanic_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM mechanics WHERE id = $1 AND is_active = true)",
            )
            .bind(mechanic_id)
            .fetch_one(&self.db)
            .await?;
            if !exists {
                return Err(AppError::NotFound("Mechanic".to_string()));
            }
        }

        let client_id = input.client_id.unwrap_or(vehicle.1);
        let priority = input.priority.unwrap_or_default();

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO work_orders (
                description, estado, priority, vehicle_id, client_id, mechanic_id,
                created_by, estimated_cost, odometer_in, fuel_level_in
            )
            VALUES ($1, 'pendiente', $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ORDER_COLUMNS}
            "#,
        ))
        .bind(&input.description)
        .bind(priority.as_str())
        .bind(input.vehicle_id)
        .bind(client_id)
        .bind(input.mechanic_id)
        .bind(created_by)
        .bind(input.estimated_cost)
        .bind(input.odometer_in)
        .bind(input.fuel_level_in)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// Fetch a bare work order
    pub async fn get_order(&self, order_id: Uuid) -> AppResult<WorkOrder> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM work_orders WHERE id = $1",
        ))
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Work order".to_string()))?;

        row.into_model()
    }

    /// Fetch a work order with history, parts, labor, and running cost
    /// materialized in one snapshot
    pub async fn get_order_detail(&self, order_id: Uuid) -> AppResult<OrderDetail> {
        let order = self.get_order(order_id).await?;
        let history = self.get_state_history(order_id).await?;
        let parts = self.get_order_parts(order_id).await?;
        let labor = self.list_labor(order_id).await?;
        let cost = self.compute_cost(order_id).await?;

        Ok(OrderDetail {
            order,
            history,
            parts,
            labor,
            cost,
        })
    }

    /// List work orders newest first, optionally filtered by state
    pub async fn list_orders(
        &self,
        state: Option<OrderState>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<WorkOrder>> {
        let pagination = pagination.clamped();

        let (total, rows) = match state {
            Some(state) => {
                let total = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM work_orders WHERE estado = $1",
                )
                .bind(state.as_str())
                .fetch_one(&self.db)
                .await?;

                let rows = sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM work_orders WHERE estado = $1 \
                     ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                ))
                .bind(state.as_str())
                .bind(pagination.limit())
                .bind(pagination.offset())
                .fetch_all(&self.db)
                .await?;

                (total, rows)
            }
            None => {
                let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM work_orders")
                    .fetch_one(&self.db)
                    .await?;

                let rows = sqlx::query_as::<_, OrderRow>(&format!(
                    "SELECT {ORDER_COLUMNS} FROM work_orders \
                     ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                ))
                .bind(pagination.limit())
                .bind(pagination.offset())
                .fetch_all(&self.db)
                .await?;

                (total, rows)
            }
        };

        let data = rows
            .into_iter()
            .map(OrderRow::into_model)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PaginatedResponse {
            pagination: PaginationMeta::new(&pagination, total as u64),
            data,
        })
    }

    /// Transition a work order to a new state.
    ///
    /// State update, `fecha_fin` bookkeeping, and the history row commit
    /// in one transaction; an illegal transition leaves everything
    /// untouched. Leaving `completado` is refused while a non-void
    /// invoice references the order: the invoice must be voided first.
    pub async fn change_state(
        &self,
        order_id: Uuid,
        actor: Uuid,
        input: ChangeStateInput,
    ) -> AppResult<WorkOrder> {
        let mut tx = self.db.begin().await?;

        // Row lock so concurrent transitions serialize
        let current = sqlx::query_scalar::<_, String>(
            "SELECT estado FROM work_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Work order".to_string()))?;

        let current = OrderState::from_str(&current)
            .ok_or_else(|| AppError::Internal(format!("unknown state in database: {}", current)))?;
        let target = input.new_state;

        current.validate_transition(target)?;

        if current == OrderState::Completado && target != OrderState::Completado {
            let invoiced = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM invoices WHERE work_order_id = $1 AND estado <> 'anulada')",
            )
            .bind(order_id)
            .fetch_one(&mut *tx)
            .await?;

            if invoiced {
                return Err(AppError::Conflict {
                    resource: "work_order".to_string(),
                    message: "Cannot reopen a work order with an active invoice; void the invoice first"
                        .to_string(),
                    message_es: "No se puede reabrir un servicio con factura activa; anule la factura primero"
                        .to_string(),
                });
            }
        }

        let now = Utc::now();
        let fecha_fin = if target == OrderState::Completado {
            Some(now)
        } else {
            None
        };

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE work_orders
            SET estado = $1, fecha_fin = $2, updated_at = $3
            WHERE id = $4
            RETURNING {ORDER_COLUMNS}
            "#,
        ))
        .bind(target.as_str())
        .bind(fecha_fin)
        .bind(now)
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        // Exactly one history row per successful transition
        sqlx::query(
            r#"
            INSERT INTO state_history (work_order_id, previous_state, new_state, comment, changed_by, changed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order_id)
        .bind(current.as_str())
        .bind(target.as_str())
        .bind(&input.comment)
        .bind(actor)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order_id,
            from = %current,
            to = %target,
            "work order state changed"
        );

        row.into_model()
    }

    /// Append-only audit trail of state transitions, oldest first
    pub async fn get_state_history(&self, order_id: Uuid) -> AppResult<Vec<StateHistoryEntry>> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, String, String, Option<String>, Uuid, DateTime<Utc>)>(
            r#"
            SELECT id, work_order_id, previous_state, new_state, comment, changed_by, changed_at
            FROM state_history
            WHERE work_order_id = $1
            ORDER BY changed_at ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|r| {
                let previous_state = OrderState::from_str(&r.2)
                    .ok_or_else(|| AppError::Internal(format!("unknown state in history: {}", r.2)))?;
                let new_state = OrderState::from_str(&r.3)
                    .ok_or_else(|| AppError::Internal(format!("unknown state in history: {}", r.3)))?;
                Ok(StateHistoryEntry {
                    id: r.0,
                    work_order_id: r.1,
                    previous_state,
                    new_state,
                    comment: r.4,
                    changed_by: r.5,
                    changed_at: r.6,
                })
            })
            .collect()
    }

    /// Record or amend the diagnosis on an order
    pub async fn record_diagnosis(&self, order_id: Uuid, input: DiagnosisInput) -> AppResult<WorkOrder> {
        let existing = sqlx::query_as::<_, (Option<String>, Option<String>, Option<Decimal>)>(
            "SELECT diagnosis, recommendations, estimated_cost FROM work_orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Work order".to_string()))?;

        let diagnosis = input.diagnosis.or(existing.0);
        let recommendations = input.recommendations.or(existing.1);
        let estimated_cost = input.estimated_cost.or(existing.2);

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE work_orders
            SET diagnosis = $1, recommendations = $2, estimated_cost = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {ORDER_COLUMNS}
            "#,
        ))
        .bind(&diagnosis)
        .bind(&recommendations)
        .bind(estimated_cost)
        .bind(order_id)
        .fetch_one(&self.db)
        .await?;

        row.into_model()
    }

    /// Record return readings (odometer / fuel level at hand-back)
    pub async fn record_readings(&self, order_id: Uuid, input: ReadingsInput) -> AppResult<WorkOrder> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            UPDATE work_orders
            SET odometer_out = COALESCE($1, odometer_out),
                fuel_level_out = COALESCE($2, fuel_level_out),
                updated_at = NOW()
            WHERE id = $3
            RETURNING {ORDER_COLUMNS}
            "#,
        ))
        .bind(input.odometer_out)
        .bind(input.fuel_level_out)
        .bind(order_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Work order".to_string()))?;

        row.into_model()
    }

    /// Delete a work order. Blocked while any invoice references it.
    pub async fn delete_order(&self, order_id: Uuid) -> AppResult<()> {
        let invoiced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM invoices WHERE work_order_id = $1)",
        )
        .bind(order_id)
        .fetch_one(&self.db)
        .await?;

        if invoiced {
            return Err(AppError::Conflict {
                resource: "work_order".to_string(),
                message: "Cannot delete a work order that has invoices".to_string(),
                message_es: "No se puede eliminar un servicio con facturas".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM work_orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Work order".to_string()));
        }

        Ok(())
    }

    /// Log a block of mechanic hours against an order.
    /// A mechanic's entries across all orders on one date cannot exceed 24h.
    pub async fn log_labor(&self, order_id: Uuid, input: LogLaborInput) -> AppResult<LaborEntry> {
        if let Err(msg) = validate_hours(input.hours) {
            return Err(AppError::Validation {
                field: "hours".to_string(),
                message: msg.to_string(),
                message_es: "Las horas deben ser positivas y no exceder 24".to_string(),
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

        let mechanic_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM mechanics WHERE id = $1)",
        )
        .bind(input.mechanic_id)
        .fetch_one(&self.db)
        .await?;
        if !mechanic_exists {
            return Err(AppError::NotFound("Mechanic".to_string()));
        }

        let logged_today = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT SUM(hours) FROM labor_entries WHERE mechanic_id = $1 AND work_date = $2",
        )
        .bind(input.mechanic_id)
        .bind(input.work_date)
        .fetch_one(&self.db)
        .await?
        .unwrap_or(Decimal::ZERO);

        if let Err(msg) = validate_daily_hours(logged_today, input.hours) {
            return Err(AppError::Validation {
                field: "hours".to_string(),
                message: msg.to_string(),
                message_es: "El mecánico excedería 24 horas registradas en esta fecha".to_string(),
            });
        }

        let entry = sqlx::query_as::<_, (Uuid, Uuid, Uuid, NaiveDate, Decimal, Option<String>, DateTime<Utc>)>(
            r#"
            INSERT INTO labor_entries (work_order_id, mechanic_id, work_date, hours, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, work_order_id, mechanic_id, work_date, hours, note, created_at
            "#,
        )
        .bind(order_id)
        .bind(input.mechanic_id)
        .bind(input.work_date)
        .bind(input.hours)
        .bind(&input.note)
        .fetch_one(&self.db)
        .await?;

        Ok(LaborEntry {
            id: entry.0,
            work_order_id: entry.1,
            mechanic_id: entry.2,
            work_date: entry.3,
            hours: entry.4,
            note: entry.5,
            created_at: entry.6,
        })
    }

    /// Labor entries for an order, oldest first
    pub async fn list_labor(&self, order_id: Uuid) -> AppResult<Vec<LaborEntry>> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, Uuid, NaiveDate, Decimal, Option<String>, DateTime<Utc>)>(
            r#"
            SELECT id, work_order_id, mechanic_id, work_date, hours, note, created_at
            FROM labor_entries
            WHERE work_order_id = $1
            ORDER BY work_date ASC, created_at ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LaborEntry {
                id: r.0,
                work_order_id: r.1,
                mechanic_id: r.2,
                work_date: r.3,
                hours: r.4,
                note: r.5,
                created_at: r.6,
            })
            .collect())
    }

    /// Remove a labor entry. Blocked once the order is invoiced, since
    /// the frozen total must stay explainable from the books.
    pub async fn delete_labor_entry(&self, order_id: Uuid, entry_id: Uuid) -> AppResult<()> {
        let invoiced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM invoices WHERE work_order_id = $1 AND estado <> 'anulada')",
        )
        .bind(order_id)
        .fetch_one(&self.db)
        .await?;

        if invoiced {
            return Err(AppError::Conflict {
                resource: "labor_entry".to_string(),
                message: "Cannot remove labor from an invoiced work order".to_string(),
                message_es: "No se puede quitar mano de obra de un servicio facturado".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM labor_entries WHERE id = $1 AND work_order_id = $2")
            .bind(entry_id)
            .bind(order_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Labor entry".to_string()));
        }

        Ok(())
    }

    /// Parts currently consumed by an order (unreversed consumption rows)
    pub async fn get_order_parts(&self, order_id: Uuid) -> AppResult<Vec<OrderPart>> {
        let parts = sqlx::query_as::<_, OrderPart>(
            r#"
            SELECT m.part_id, p.code, p.name, m.quantity, p.sale_price
            FROM inventory_movements m
            JOIN parts p ON p.id = m.part_id
            WHERE m.work_order_id = $1
              AND m.movement_type = 'salida'
              AND m.category = 'consumo'
              AND m.reversed = false
            ORDER BY m.created_at ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(parts)
    }

    /// Current cost of the order: parts plus labor. Recomputed on every
    /// call until the billing service freezes it into an invoice.
    pub async fn compute_cost(&self, order_id: Uuid) -> AppResult<CostBreakdown> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM work_orders WHERE id = $1)",
        )
        .bind(order_id)
        .fetch_one(&self.db)
        .await?;
        if !exists {
            return Err(AppError::NotFound("Work order".to_string()));
        }

        let mut conn = self.db.acquire().await?;
        aggregate_cost(&mut conn, order_id).await
    }
}
