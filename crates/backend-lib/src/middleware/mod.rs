// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the identity backend.

pub mod auth;

pub use auth::require_access;
