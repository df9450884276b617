//! Vehicle models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A client's vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub client_id: Uuid,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub year: Option<i16>,
    pub color: Option<String>,
    pub vin: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
