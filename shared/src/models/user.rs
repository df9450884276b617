//! User account models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Language;

/// A user account on the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub preferred_language: Language,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Roles within the workshop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Recepcion,
    Mecanico,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Recepcion => "recepcion",
            UserRole::Mecanico => "mecanico",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "recepcion" => Some(UserRole::Recepcion),
            "mecanico" => Some(UserRole::Mecanico),
            _ => None,
        }
    }

    /// Whether this role may manage users and void invoices
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}
