// ============================
// crates/backend-lib/src/auth/credentials.rs
// ============================
//! Login credential verification.
use super::PasswordHasher;
use crate::error::AppError;
use crate::storage::UserStore;

/// Checks a (username, password) pair against the stored digest
#[derive(Clone)]
pub struct CredentialVerifier<S> {
    store: S,
    hasher: PasswordHasher,
}

impl<S: UserStore> CredentialVerifier<S> {
    pub fn new(store: S, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// `Ok(false)` for an unknown user or a wrong password; the two cases are
    /// indistinguishable to the caller. Only store failures are errors.
    ///
    /// The unknown-user path skips hashing, so response timing still differs.
    pub async fn verify(&self, username: &str, plain: &str) -> Result<bool, AppError> {
        let Some(user) = self.store.find_by_username(username).await? else {
            return Ok(false);
        };

        let candidate = self.hasher.hash(username, plain);
        Ok(candidate.as_bytes() == user.password_digest.as_bytes())
    }
}
