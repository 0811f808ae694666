//! The authenticated caller attached to guarded requests.
use crate::storage::UserRecord;
use serde::Serialize;

/// Identity resolved from a valid bearer token. Built per request from the
/// store, never persisted and never embedded in the token beyond the username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

impl From<UserRecord> for Principal {
    fn from(user: UserRecord) -> Self {
        Self {
            username: user.username,
            firstname: user.firstname,
            lastname: user.lastname,
            email: user.email,
        }
    }
}
