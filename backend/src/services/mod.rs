//! Business logic services for AutoManager

pub mod auth;
pub mod billing;
pub mod client;
pub mod costing;
pub mod inventory;
pub mod mechanic;
pub mod notification;
pub mod part;
pub mod vehicle;
pub mod workorder;

pub use auth::AuthService;
pub use billing::BillingService;
pub use client::ClientService;
pub use inventory::InventoryService;
pub use mechanic::MechanicService;
pub use notification::NotificationService;
pub use part::PartService;
pub use vehicle::VehicleService;
pub use workorder::WorkOrderService;
