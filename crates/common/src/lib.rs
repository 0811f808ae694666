// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between `DeviceHub` clients and the server.
//! This module defines the JSON request and reply bodies of the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /api/auth/register`
#[derive(Serialize, Deserialize, Clone)]
pub struct CreateUserCommand {
    pub username: String,
    pub password: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

/// Body of `POST /api/auth/login`
#[derive(Serialize, Deserialize, Clone)]
pub struct LoginCommand {
    pub username: String,
    pub password: String,
}

// Plaintext passwords never reach the logs through `{:?}`.
impl fmt::Debug for CreateUserCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserCommand")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("firstname", &self.firstname)
            .field("lastname", &self.lastname)
            .field("email", &self.email)
            .finish()
    }
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login reply carrying the signed bearer token
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginReply {
    pub token: String,
}

/// Profile of the caller, as returned by `GET /api/users/me`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A managed device
/// # Fields
/// * `id` - Server-assigned identifier
/// * `address` - Network address of the device (e.g. "10.10.10.10")
/// * `is_active` - Activation flag, `false` on creation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDto {
    pub id: String,
    pub name: String,
    pub address: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/devices`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateDeviceCommand {
    pub name: String,
    pub address: String,
}

/// Body of `PUT /api/devices/{id}`; absent fields are left unchanged
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateDeviceCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}
