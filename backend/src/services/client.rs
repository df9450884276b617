//! Client management service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{validate_email, validate_phone, Client};

/// Client service
#[derive(Clone)]
pub struct ClientService {
    db: PgPool,
}

/// Input for creating a client
#[derive(Debug, Deserialize)]
pub struct CreateClientInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Input for updating a client
#[derive(Debug, Deserialize)]
pub struct UpdateClientInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

type ClientTuple = (
    Uuid,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn to_client(r: ClientTuple) -> Client {
    Client {
        id: r.0,
        name: r.1,
        email: r.2,
        phone: r.3,
        address: r.4,
        created_at: r.5,
        updated_at: r.6,
    }
}

impl ClientService {
    /// Create a new ClientService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn validate(
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> AppResult<()> {
        if name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Client name cannot be empty".to_string(),
                message_es: "El nombre del cliente no puede estar vacío".to_string(),
            });
        }
        if let Some(email) = email {
            if let Err(msg) = validate_email(email) {
                return Err(AppError::Validation {
                    field: "email".to_string(),
                    message: msg.to_string(),
                    message_es: "Formato de correo inválido".to_string(),
                });
            }
        }
        if let Some(phone) = phone {
            if let Err(msg) = validate_phone(phone) {
                return Err(AppError::Validation {
                    field: "phone".to_string(),
                    message: msg.to_string(),
                    message_es: "Formato de teléfono inválido".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Create a client
    pub async fn create_client(&self, input: CreateClientInput) -> AppResult<Client> {
        Self::validate(&input.name, input.email.as_deref(), input.phone.as_deref())?;

        let row = sqlx::query_as::<_, ClientTuple>(
            r#"
            INSERT INTO clients (name, email, phone, address)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, phone, address, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        Ok(to_client(row))
    }

    /// List all clients
    pub async fn list_clients(&self) -> AppResult<Vec<Client>> {
        let rows = sqlx::query_as::<_, ClientTuple>(
            r#"
            SELECT id, name, email, phone, address, created_at, updated_at
            FROM clients
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(to_client).collect())
    }

    /// Get a client by ID
    pub async fn get_client(&self, client_id: Uuid) -> AppResult<Client> {
        let row = sqlx::query_as::<_, ClientTuple>(
            r#"
            SELECT id, name, email, phone, address, created_at, updated_at
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Client".to_string()))?;

        Ok(to_client(row))
    }

    /// Update a client
    pub async fn update_client(&self, client_id: Uuid, input: UpdateClientInput) -> AppResult<Client> {
        let existing = self.get_client(client_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let email = input.email.or(existing.email);
        let phone = input.phone.or(existing.phone);
        let address = input.address.or(existing.address);

        Self::validate(&name, email.as_deref(), phone.as_deref())?;

        let row = sqlx::query_as::<_, ClientTuple>(
            r#"
            UPDATE clients
            SET name = $1, email = $2, phone = $3, address = $4, updated_at = NOW()
            WHERE id = $5
            RETURNING id, name, email, phone, address, created_at, updated_at
            "#,
        )
        .bind(&name)
        .bind(&email)
        .bind(&phone)
        .bind(&address)
        .bind(client_id)
        .fetch_one(&self.db)
        .await?;

        Ok(to_client(row))
    }

    /// Delete a client. Blocked while vehicles reference them.
    pub async fn delete_client(&self, client_id: Uuid) -> AppResult<()> {
        let has_vehicles = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE client_id = $1)",
        )
        .bind(client_id)
        .fetch_one(&self.db)
        .await?;

        if has_vehicles {
            return Err(AppError::Conflict {
                resource: "client".to_string(),
                message: "Cannot delete a client with registered vehicles".to_string(),
                message_es: "No se puede eliminar un cliente con vehículos registrados".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(client_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Client".to_string()));
        }

        Ok(())
    }
}
