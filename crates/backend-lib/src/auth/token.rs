// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
/** Bearer token issuance and verification
Tokens are HS256 JWTs carrying only the username plus `iat`/`exp`.
They are stateless: nothing is stored server-side and a token stays valid
until it expires, one hour after issuance. */
use crate::error::AppError;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, get_current_timestamp, Algorithm, DecodingKey,
    EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Validity window of every issued token
pub const TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Payload stored in the token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Principal identifier
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Mints signed tokens
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &str) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for `username` valid from now
    pub fn issue(&self, username: &str) -> Result<String, AppError> {
        self.issue_at(username, get_current_timestamp())
    }

    /// Issue a token as if minted at `issued_at` (Unix seconds)
    pub fn issue_at(&self, username: &str, issued_at: u64) -> Result<String, AppError> {
        let claims = Claims {
            username: username.to_string(),
            iat: issued_at,
            exp: issued_at + TOKEN_TTL.as_secs(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }
}

/// Checks signature and expiry of presented tokens
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; the window is already fixed at issuance.
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Decode `token`, failing with `Unauthenticated` on any defect
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|err| {
            let reason = match err.kind() {
                ErrorKind::ExpiredSignature => "token expired",
                ErrorKind::InvalidSignature => "invalid signature",
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                    "malformed token"
                },
                ErrorKind::InvalidAlgorithm => "unexpected algorithm",
                _ => "token validation failed",
            };
            AppError::Unauthenticated(reason.to_string())
        })?;

        Ok(data.claims)
    }
}
