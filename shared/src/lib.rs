//! Shared types and models for AutoManager
//!
//! This crate contains the domain types shared between the backend and
//! any other components of the system: entities, the work-order state
//! machine, and pure validation helpers that need no database.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
