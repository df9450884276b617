//! HTTP handlers for the AutoManager API

pub mod auth;
pub mod client;
pub mod health;
pub mod inventory;
pub mod invoice;
pub mod mechanic;
pub mod notification;
pub mod part;
pub mod vehicle;
pub mod workorder;

pub use auth::*;
pub use client::*;
pub use health::*;
pub use inventory::*;
pub use invoice::*;
pub use mechanic::*;
pub use notification::*;
pub use part::*;
pub use vehicle::*;
pub use workorder::*;
