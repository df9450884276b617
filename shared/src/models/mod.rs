//! Domain models for AutoManager

mod client;
mod invoice;
mod mechanic;
mod part;
mod user;
mod vehicle;
mod workorder;

pub use client::*;
pub use invoice::*;
pub use mechanic::*;
pub use part::*;
pub use user::*;
pub use vehicle::*;
pub use workorder::*;
