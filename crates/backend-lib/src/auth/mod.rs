// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.
pub mod credentials;
pub mod password;
pub mod principal;
mod service;
mod service_impl;
pub mod token;

pub use credentials::CredentialVerifier;
pub use password::PasswordHasher;
pub use principal::Principal;
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use token::{Claims, TokenIssuer, TokenVerifier, TOKEN_TTL};
