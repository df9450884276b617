//! Vehicle management service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{validate_plate, Vehicle};

/// Vehicle service
#[derive(Clone)]
pub struct VehicleService {
    db: PgPool,
}

/// Input for registering a vehicle
#[derive(Debug, Deserialize)]
pub struct CreateVehicleInput {
    pub client_id: Uuid,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: Option<i16>,
    pub color: Option<String>,
    pub vin: Option<String>,
}

/// Input for updating a vehicle
#[derive(Debug, Deserialize)]
pub struct UpdateVehicleInput {
    pub plate: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i16>,
    pub color: Option<String>,
    pub vin: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    client_id: Uuid,
    plate: String,
    brand: String,
    model: String,
    year: Option<i16>,
    color: Option<String>,
    vin: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VehicleRow> for Vehicle {
    fn from(r: VehicleRow) -> Self {
        Vehicle {
            id: r.id,
            client_id: r.client_id,
            plate: r.plate,
            brand: r.brand,
            model: r.model,
            year: r.year,
            color: r.color,
            vin: r.vin,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const VEHICLE_COLUMNS: &str =
    "id, client_id, plate, brand, model, year, color, vin, created_at, updated_at";

impl VehicleService {
    /// Create a new VehicleService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a vehicle for a client
    pub async fn create_vehicle(&self, input: CreateVehicleInput) -> AppResult<Vehicle> {
        if let Err(msg) = validate_plate(&input.plate) {
            return Err(AppError::Validation {
                field: "plate".to_string(),
                message: msg.to_string(),
                message_es: "Formato de placa inválido".to_string(),
            });
        }

        let client_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM clients WHERE id = $1)",
        )
        .bind(input.client_id)
        .fetch_one(&self.db)
        .await?;
        if !client_exists {
            return Err(AppError::NotFound("Client".to_string()));
        }

        let plate_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE plate = $1)",
        )
        .bind(&input.plate)
        .fetch_one(&self.db)
        .await?;
        if plate_taken {
            return Err(AppError::DuplicateEntry("plate".to_string()));
        }

        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            r#"
            INSERT INTO vehicles (client_id, plate, brand, model, year, color, vin)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VEHICLE_COLUMNS}
            "#,
        ))
        .bind(input.client_id)
        .bind(&input.plate)
        .bind(&input.brand)
        .bind(&input.model)
        .bind(input.year)
        .bind(&input.color)
        .bind(&input.vin)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// List vehicles, optionally restricted to one client
    pub async fn list_vehicles(&self, client_id: Option<Uuid>) -> AppResult<Vec<Vehicle>> {
        let rows = match client_id {
            Some(client_id) => {
                sqlx::query_as::<_, VehicleRow>(&format!(
                    "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE client_id = $1 ORDER BY created_at DESC",
                ))
                .bind(client_id)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, VehicleRow>(&format!(
                    "SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY created_at DESC",
                ))
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(rows.into_iter().map(Vehicle::from).collect())
    }

    /// Get a vehicle by ID
    pub async fn get_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vehicle> {
        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1",
        ))
        .bind(vehicle_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle".to_string()))?;

        Ok(row.into())
    }

    /// Update a vehicle
    pub async fn update_vehicle(&self, vehicle_id: Uuid, input: UpdateVehicleInput) -> AppResult<Vehicle> {
        let existing = self.get_vehicle(vehicle_id).await?;

        let plate = input.plate.unwrap_or(existing.plate);
        if let Err(msg) = validate_plate(&plate) {
            return Err(AppError::Validation {
                field: "plate".to_string(),
                message: msg.to_string(),
                message_es: "Formato de placa inválido".to_string(),
            });
        }

        let brand = input.brand.unwrap_or(existing.brand);
        let model = input.model.unwrap_or(existing.model);
        let year = input.year.or(existing.year);
        let color = input.color.or(existing.color);
        let vin = input.vin.or(existing.vin);

        let row = sqlx::query_as::<_, VehicleRow>(&format!(
            r#"
            UPDATE vehicles
            SET plate = $1, brand = $2, model = $3, year = $4, color = $5, vin = $6, updated_at = NOW()
            WHERE id = $7
            RETURNING {VEHICLE_COLUMNS}
            "#,
        ))
        .bind(&plate)
        .bind(&brand)
        .bind(&model)
        .bind(year)
        .bind(&color)
        .bind(&vin)
        .bind(vehicle_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Delete a vehicle. Blocked while work orders reference it.
    pub async fn delete_vehicle(&self, vehicle_id: Uuid) -> AppResult<()> {
        let has_orders = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM work_orders WHERE vehicle_id = $1)",
        )
        .bind(vehicle_id)
        .fetch_one(&self.db)
        .await?;

        if has_orders {
            return Err(AppError::Conflict {
                resource: "vehicle".to_string(),
                message: "Cannot delete a vehicle with work orders".to_string(),
                message_es: "No se puede eliminar un vehículo con servicios registrados".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM vehicles WHERE id = $1")
            .bind(vehicle_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Vehicle".to_string()));
        }

        Ok(())
    }
}
