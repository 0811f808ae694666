use super::{AuthService, CredentialVerifier, PasswordHasher, Principal, TokenIssuer, TokenVerifier};
use crate::config::AuthSettings;
use crate::error::AppError;
use crate::storage::{UserRecord, UserStore};
use async_trait::async_trait;
use chrono::Utc;
use devicehub_common::{AuthenticatedUser, CreateUserCommand};
use uuid::Uuid;

pub struct DefaultAuth<S> {
    store: S,
    hasher: PasswordHasher,
    credentials: CredentialVerifier<S>,
    issuer: TokenIssuer,
    tokens: TokenVerifier,
}

impl<S: UserStore + Clone> DefaultAuth<S> {
    pub fn new(store: S, settings: &AuthSettings) -> Self {
        let hasher = PasswordHasher::new(settings.hashed_password_salt.as_str());
        Self {
            credentials: CredentialVerifier::new(store.clone(), hasher.clone()),
            store,
            hasher,
            issuer: TokenIssuer::new(&settings.jwt_secret),
            tokens: TokenVerifier::new(&settings.jwt_secret),
        }
    }
}

#[async_trait]
impl<S: UserStore + Clone> AuthService for DefaultAuth<S> {
    async fn register(&self, cmd: CreateUserCommand) -> Result<AuthenticatedUser, AppError> {
        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            password_digest: self.hasher.hash(&cmd.username, &cmd.password),
            username: cmd.username,
            firstname: cmd.firstname,
            lastname: cmd.lastname,
            email: cmd.email,
            created_at: now,
            updated_at: now,
        };
        let profile = user.to_authenticated_user();

        self.store.insert_user(user).await?;
        tracing::info!(username = %profile.username, "user registered");
        Ok(profile)
    }

    async fn login(&self, username: &str, password: &str) -> Result<String, AppError> {
        if !self.credentials.verify(username, password).await? {
            tracing::info!(username = %username, "login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.issuer.issue(username)?;
        tracing::info!(username = %username, "login succeeded");
        Ok(token)
    }

    async fn authenticate(&self, token: &str) -> Result<Principal, AppError> {
        let claims = self.tokens.verify(token)?;

        // A valid token for a user that no longer exists is just as unauthenticated.
        match self.store.find_by_username(&claims.username).await? {
            Some(user) => Ok(Principal::from(user)),
            None => Err(AppError::Unauthenticated(format!(
                "principal {:?} not found",
                claims.username
            ))),
        }
    }
}
