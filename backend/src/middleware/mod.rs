//! Middleware for AutoManager

mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
