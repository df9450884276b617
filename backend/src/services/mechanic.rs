//! Mechanic management service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{validate_amount, Mechanic};

/// Mechanic service
#[derive(Clone)]
pub struct MechanicService {
    db: PgPool,
}

/// Input for registering a mechanic
#[derive(Debug, Deserialize)]
pub struct CreateMechanicInput {
    pub name: String,
    pub specialty: Option<String>,
    pub hourly_rate: Decimal,
}

/// Input for updating a mechanic
#[derive(Debug, Deserialize)]
pub struct UpdateMechanicInput {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub is_active: Option<bool>,
}

#[derive(Debug, sqlx::FromRow)]
struct MechanicRow {
    id: Uuid,
    name: String,
    specialty: Option<String>,
    hourly_rate: Decimal,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MechanicRow> for Mechanic {
    fn from(r: MechanicRow) -> Self {
        Mechanic {
            id: r.id,
            name: r.name,
            specialty: r.specialty,
            hourly_rate: r.hourly_rate,
            is_active: r.is_active,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const MECHANIC_COLUMNS: &str =
    "id, name, specialty, hourly_rate, is_active, created_at, updated_at";

impl MechanicService {
    /// Create a new MechanicService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a mechanic
    pub async fn create_mechanic(&self, input: CreateMechanicInput) -> AppResult<Mechanic> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Mechanic name cannot be empty".to_string(),
                message_es: "El nombre del mecánico no puede estar vacío".to_string(),
            });
        }
        if let Err(msg) = validate_amount(input.hourly_rate) {
            return Err(AppError::Validation {
                field: "hourly_rate".to_string(),
                message: msg.to_string(),
                message_es: "La tarifa por hora debe ser positiva".to_string(),
            });
        }

        let row = sqlx::query_as::<_, MechanicRow>(&format!(
            r#"
            INSERT INTO mechanics (name, specialty, hourly_rate)
            VALUES ($1, $2, $3)
            RETURNING {MECHANIC_COLUMNS}
            "#,
        ))
        .bind(&input.name)
        .bind(&input.specialty)
        .bind(input.hourly_rate)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// List mechanics; inactive ones are included so history stays legible
    pub async fn list_mechanics(&self) -> AppResult<Vec<Mechanic>> {
        let rows = sqlx::query_as::<_, MechanicRow>(&format!(
            "SELECT {MECHANIC_COLUMNS} FROM mechanics ORDER BY name ASC",
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Mechanic::from).collect())
    }

    /// Get a mechanic by ID
    pub async fn get_mechanic(&self, mechanic_id: Uuid) -> AppResult<Mechanic> {
        let row = sqlx::query_as::<_, MechanicRow>(&format!(
            "SELECT {MECHANIC_COLUMNS} FROM mechanics WHERE id = $1",
        ))
        .bind(mechanic_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Mechanic".to_string()))?;

        Ok(row.into())
    }

    /// Update a mechanic. Rate changes only affect labor logged afterwards
    /// at cost-computation time, since invoices freeze their totals.
    pub async fn update_mechanic(&self, mechanic_id: Uuid, input: UpdateMechanicInput) -> AppResult<Mechanic> {
        let existing = self.get_mechanic(mechanic_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let specialty = input.specialty.or(existing.specialty);
        let hourly_rate = input.hourly_rate.unwrap_or(existing.hourly_rate);
        let is_active = input.is_active.unwrap_or(existing.is_active);

        if let Err(msg) = validate_amount(hourly_rate) {
            return Err(AppError::Validation {
                field: "hourly_rate".to_string(),
                message: msg.to_string(),
                message_es: "La tarifa por hora debe ser positiva".to_string(),
            });
        }

        let row = sqlx::query_as::<_, MechanicRow>(&format!(
            r#"
            UPDATE mechanics
            SET name = $1, specialty = $2, hourly_rate = $3, is_active = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING {MECHANIC_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(&specialty)
        .bind(hourly_rate)
        .bind(is_active)
        .bind(mechanic_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Delete a mechanic. Mechanics referenced by work orders or labor
    /// entries are deactivated instead, never removed.
    pub async fn delete_mechanic(&self, mechanic_id: Uuid) -> AppResult<Mechanic> {
        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM work_orders WHERE mechanic_id = $1)
                OR EXISTS(SELECT 1 FROM labor_entries WHERE mechanic_id = $1)
            "#,
        )
        .bind(mechanic_id)
        .fetch_one(&self.db)
        .await?;

        if referenced {
            let row = sqlx::query_as::<_, MechanicRow>(&format!(
                r#"
                UPDATE mechanics SET is_active = false, updated_at = NOW() WHERE id = $1
                RETURNING {MECHANIC_COLUMNS}
                "#,
            ))
            .bind(mechanic_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Mechanic".to_string()))?;

            return Ok(row.into());
        }

        let row = sqlx::query_as::<_, MechanicRow>(&format!(
            "DELETE FROM mechanics WHERE id = $1 RETURNING {MECHANIC_COLUMNS}",
        ))
        .bind(mechanic_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Mechanic".to_string()))?;

        Ok(row.into())
    }
}
