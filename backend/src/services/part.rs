//! Part catalog service
//!
//! CRUD for the part catalog. Stock is deliberately absent from the
//! update input: every stock change goes through the inventory ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{validate_amount, validate_part_code, Part};

/// Part service
#[derive(Clone)]
pub struct PartService {
    db: PgPool,
}

/// Input for creating a part
#[derive(Debug, Deserialize)]
pub struct CreatePartInput {
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
    pub min_stock: Option<i32>,
}

/// Input for updating a part (prices and threshold; never stock)
#[derive(Debug, Deserialize)]
pub struct UpdatePartInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
    pub min_stock: Option<i32>,
}

#[derive(Debug, sqlx::FromRow)]
struct PartRow {
    id: Uuid,
    code: String,
    name: String,
    category: Option<String>,
    purchase_price: Decimal,
    sale_price: Decimal,
    stock: i32,
    min_stock: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PartRow> for Part {
    fn from(r: PartRow) -> Self {
        Part {
            id: r.id,
            code: r.code,
            name: r.name,
            category: r.category,
            purchase_price: r.purchase_price,
            sale_price: r.sale_price,
            stock: r.stock,
            min_stock: r.min_stock,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

const PART_COLUMNS: &str =
    "id, code, name, category, purchase_price, sale_price, stock, min_stock, created_at, updated_at";

impl PartService {
    /// Create a new PartService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    fn validate_prices(purchase: Decimal, sale: Decimal) -> AppResult<()> {
        if let Err(msg) = validate_amount(purchase) {
            return Err(AppError::Validation {
                field: "purchase_price".to_string(),
                message: msg.to_string(),
                message_es: "El precio de compra debe ser positivo".to_string(),
            });
        }
        if let Err(msg) = validate_amount(sale) {
            return Err(AppError::Validation {
                field: "sale_price".to_string(),
                message: msg.to_string(),
                message_es: "El precio de venta debe ser positivo".to_string(),
            });
        }
        Ok(())
    }

    /// Create a part with zero stock; receiving goes through the ledger
    pub async fn create_part(&self, input: CreatePartInput) -> AppResult<Part> {
        if let Err(msg) = validate_part_code(&input.code) {
            return Err(AppError::Validation {
                field: "code".to_string(),
                message: msg.to_string(),
                message_es: "Formato de código de repuesto inválido".to_string(),
            });
        }
        Self::validate_prices(input.purchase_price, input.sale_price)?;

        let min_stock = input.min_stock.unwrap_or(0);
        if min_stock < 0 {
            return Err(AppError::Validation {
                field: "min_stock".to_string(),
                message: "Minimum stock cannot be negative".to_string(),
                message_es: "El stock mínimo no puede ser negativo".to_string(),
            });
        }

        let code_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM parts WHERE code = $1)",
        )
        .bind(&input.code)
        .fetch_one(&self.db)
        .await?;
        if code_taken {
            return Err(AppError::DuplicateEntry("code".to_string()));
        }

        let row = sqlx::query_as::<_, PartRow>(&format!(
            r#"
            INSERT INTO parts (code, name, category, purchase_price, sale_price, stock, min_stock)
            VALUES ($1, $2, $3, $4, $5, 0, $6)
            RETURNING {PART_COLUMNS}
            "#,
        ))
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.category)
        .bind(input.purchase_price)
        .bind(input.sale_price)
        .bind(min_stock)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// List parts, optionally only those at or below their minimum stock
    pub async fn list_parts(&self, low_stock_only: bool) -> AppResult<Vec<Part>> {
        let rows = if low_stock_only {
            sqlx::query_as::<_, PartRow>(&format!(
                "SELECT {PART_COLUMNS} FROM parts WHERE stock <= min_stock ORDER BY code ASC",
            ))
            .fetch_all(&self.db)
            .await?
        } else {
            sqlx::query_as::<_, PartRow>(&format!(
                "SELECT {PART_COLUMNS} FROM parts ORDER BY code ASC",
            ))
            .fetch_all(&self.db)
            .await?
        };

        Ok(rows.into_iter().map(Part::from).collect())
    }

    /// Get a part by ID
    pub async fn get_part(&self, part_id: Uuid) -> AppResult<Part> {
        let row = sqlx::query_as::<_, PartRow>(&format!(
            "SELECT {PART_COLUMNS} FROM parts WHERE id = $1",
        ))
        .bind(part_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Part".to_string()))?;

        Ok(row.into())
    }

    /// Update part metadata and prices. Stock is not updatable here.
    pub async fn update_part(&self, part_id: Uuid, input: UpdatePartInput) -> AppResult<Part> {
        let existing = self.get_part(part_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let category = input.category.or(existing.category);
        let purchase_price = input.purchase_price.unwrap_or(existing.purchase_price);
        let sale_price = input.sale_price.unwrap_or(existing.sale_price);
        let min_stock = input.min_stock.unwrap_or(existing.min_stock);

        Self::validate_prices(purchase_price, sale_price)?;
        if min_stock < 0 {
            return Err(AppError::Validation {
                field: "min_stock".to_string(),
                message: "Minimum stock cannot be negative".to_string(),
                message_es: "El stock mínimo no puede ser negativo".to_string(),
            });
        }

        let row = sqlx::query_as::<_, PartRow>(&format!(
            r#"
            UPDATE parts
            SET name = $1, category = $2, purchase_price = $3, sale_price = $4, min_stock = $5, updated_at = NOW()
            WHERE id = $6
            RETURNING {PART_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(&category)
        .bind(purchase_price)
        .bind(sale_price)
        .bind(min_stock)
        .bind(part_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Delete a part. Blocked while movements reference it, since the
    /// ledger must stay explainable.
    pub async fn delete_part(&self, part_id: Uuid) -> AppResult<()> {
        let has_movements = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory_movements WHERE part_id = $1)",
        )
        .bind(part_id)
        .fetch_one(&self.db)
        .await?;

        if has_movements {
            return Err(AppError::Conflict {
                resource: "part".to_string(),
                message: "Cannot delete a part with inventory movements".to_string(),
                message_es: "No se puede eliminar un repuesto con movimientos de inventario".to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM parts WHERE id = $1")
            .bind(part_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Part".to_string()));
        }

        Ok(())
    }
}
