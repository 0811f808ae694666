// =============
// crates/backend-lib/src/auth/service.rs
// =============
//! This module defines the `AuthService` trait, which is used for authentication
use super::Principal;
use crate::error::AppError;
use async_trait::async_trait;
use devicehub_common::{AuthenticatedUser, CreateUserCommand};

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Hash the password and persist a new user
    async fn register(&self, cmd: CreateUserCommand) -> Result<AuthenticatedUser, AppError>;

    /// Check credentials and mint a bearer token.
    /// Fails with `InvalidCredentials` for unknown users and wrong passwords alike.
    async fn login(&self, username: &str, password: &str) -> Result<String, AppError>;

    /// Resolve a bearer token to the principal it was issued for
    async fn authenticate(&self, token: &str) -> Result<Principal, AppError>;
}
