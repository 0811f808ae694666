// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the `DeviceHub` server.

pub mod auth;

pub use auth::{bearer_token, require_auth};
