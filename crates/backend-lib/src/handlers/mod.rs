//! HTTP request handlers.
pub mod auth;
pub mod devices;
pub mod users;

/// Health check endpoint
pub async fn health() -> &'static str {
    "Healthy"
}
