//! Mechanic models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A workshop mechanic. Labor is billed at `hourly_rate`; mechanics
/// referenced by existing work orders are deactivated, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mechanic {
    pub id: Uuid,
    pub name: String,
    pub specialty: Option<String>,
    pub hourly_rate: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
