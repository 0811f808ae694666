// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing.
//!
//! Digests are deterministic: `base64(sha256(plain || base64(sha256(username || server_salt))))`.
//! There is no per-call random salt, so a digest can be recomputed and
//! compared directly at login. This keeps stored credentials compatible with
//! existing databases but is weaker against precomputed tables than a
//! memory-hard KDF. Changing it invalidates every stored digest.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};

/// Derives password digests from a process-wide server salt
#[derive(Clone)]
pub struct PasswordHasher {
    server_salt: String,
}

impl PasswordHasher {
    pub fn new(server_salt: impl Into<String>) -> Self {
        Self {
            server_salt: server_salt.into(),
        }
    }

    /// Hash `plain` for `username`. Pure: identical inputs give identical output.
    pub fn hash(&self, username: &str, plain: &str) -> String {
        let salt = self.user_salt(username);
        let digest = Sha256::new()
            .chain_update(plain.as_bytes())
            .chain_update(salt.as_bytes())
            .finalize();
        STANDARD.encode(digest)
    }

    /// Per-user salt, derived and never stored
    fn user_salt(&self, username: &str) -> String {
        let digest = Sha256::new()
            .chain_update(username.as_bytes())
            .chain_update(self.server_salt.as_bytes())
            .finalize();
        STANDARD.encode(digest)
    }
}
