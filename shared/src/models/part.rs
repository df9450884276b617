//! Stocked parts and the inventory movement ledger

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stocked part. `stock` is never written directly; every change goes
/// through an `InventoryMovement`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
    pub stock: i32,
    pub min_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Part {
    pub fn is_below_minimum(&self) -> bool {
        self.stock <= self.min_stock
    }
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Entrada,
    Salida,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entrada => "entrada",
            MovementType::Salida => "salida",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "entrada" => Some(MovementType::Entrada),
            "salida" => Some(MovementType::Salida),
            _ => None,
        }
    }
}

/// Why a movement happened. `Ajuste` rows document an edit to an earlier
/// movement and are excluded from stock reconciliation and costing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementCategory {
    Compra,
    Consumo,
    Devolucion,
    Ajuste,
}

impl MovementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementCategory::Compra => "compra",
            MovementCategory::Consumo => "consumo",
            MovementCategory::Devolucion => "devolucion",
            MovementCategory::Ajuste => "ajuste",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "compra" => Some(MovementCategory::Compra),
            "consumo" => Some(MovementCategory::Consumo),
            "devolucion" => Some(MovementCategory::Devolucion),
            "ajuste" => Some(MovementCategory::Ajuste),
            _ => None,
        }
    }
}

/// Immutable record of one stock change. Reversals are expressed with a
/// compensating row that points back via `reverses`; nothing is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryMovement {
    pub id: Uuid,
    pub part_id: Uuid,
    pub movement_type: MovementType,
    pub category: MovementCategory,
    pub quantity: i32,
    pub work_order_id: Option<Uuid>,
    pub reversed: bool,
    pub reverses: Option<Uuid>,
    pub note: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn part(stock: i32, min_stock: i32) -> Part {
        Part {
            id: Uuid::new_v4(),
            code: "FIL-001".into(),
            name: "Filtro de aceite".into(),
            category: Some("filtros".into()),
            purchase_price: dec("80.00"),
            sale_price: dec("120.00"),
            stock,
            min_stock,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn minimum_stock_threshold_is_inclusive() {
        assert!(part(5, 5).is_below_minimum());
        assert!(part(3, 5).is_below_minimum());
        assert!(!part(6, 5).is_below_minimum());
    }

    #[test]
    fn movement_type_round_trip() {
        assert_eq!(MovementType::from_str("entrada"), Some(MovementType::Entrada));
        assert_eq!(MovementType::from_str("salida"), Some(MovementType::Salida));
        assert_eq!(MovementType::from_str("transfer"), None);
    }

    #[test]
    fn movement_category_round_trip() {
        for c in [
            MovementCategory::Compra,
            MovementCategory::Consumo,
            MovementCategory::Devolucion,
            MovementCategory::Ajuste,
        ] {
            assert_eq!(MovementCategory::from_str(c.as_str()), Some(c));
        }
    }
}
