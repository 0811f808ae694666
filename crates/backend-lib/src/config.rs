// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered with figment: built-in defaults, then an optional
//! config file, then `DEVICEHUB_`-prefixed environment variables (`__` nests),
//! then the flat `JWT_SECRET`, `HASHED_PASSWORD_SALT` and `SERVER_PORT`
//! variables. Everything is read once at startup and never mutated.
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Signing key used when none is configured. Not safe for production.
pub const DEFAULT_JWT_SECRET: &str = "secret";

/// Password hashing secret used when none is configured. Not safe for production.
pub const DEFAULT_HASHED_PASSWORD_SALT: &str = "secret";

/// Default HTTP port
pub const DEFAULT_SERVER_PORT: u16 = 3000;

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub auth: AuthSettings,
    /// Fallback log filter when `RUST_LOG` is unset
    pub log_level: String,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Document store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Root directory of the flat-file store
    pub path: PathBuf,
}

/// Process-wide authentication secrets
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HMAC key for bearer tokens
    pub jwt_secret: String,
    /// Server-side secret mixed into every password digest
    pub hashed_password_salt: String,
}

// Secrets never reach the logs through `{:?}`.
impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("hashed_password_salt", &"<redacted>")
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            auth: AuthSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_SERVER_PORT,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data"),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            hashed_password_salt: DEFAULT_HASHED_PASSWORD_SALT.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `config.{toml,yaml,json}` in the working directory
    /// and the environment. Call [`Settings::validate`] once any command-line
    /// overrides have been applied.
    pub fn load() -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"))
            .merge(Yaml::file("config.yaml"))
            .merge(Json::file("config.json"));

        Self::extract(figment)
    }

    /// Load settings from an explicit config file, then the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }

        let base = Figment::from(Serialized::defaults(Settings::default()));
        let figment = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => base.merge(Yaml::file(path)),
            Some("json") => base.merge(Json::file(path)),
            _ => base.merge(Toml::file(path)),
        };

        Self::extract(figment)
            .with_context(|| format!("failed to load config from {}", path.display()))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let settings: Settings = figment
            .merge(Env::prefixed("DEVICEHUB_").split("__"))
            .merge(Env::raw().only(&["JWT_SECRET"]).map(|_| "auth.jwt_secret".into()))
            .merge(
                Env::raw()
                    .only(&["HASHED_PASSWORD_SALT"])
                    .map(|_| "auth.hashed_password_salt".into()),
            )
            .merge(Env::raw().only(&["SERVER_PORT"]).map(|_| "server.port".into()))
            .extract()?;

        Ok(settings)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.auth.jwt_secret.is_empty() {
            bail!("auth.jwt_secret must not be empty");
        }
        if self.auth.hashed_password_salt.is_empty() {
            bail!("auth.hashed_password_salt must not be empty");
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!("unknown log level {:?}", self.log_level);
        }
        Ok(())
    }

    /// True when either auth secret is still the well-known default
    pub fn uses_insecure_defaults(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
            || self.auth.hashed_password_salt == DEFAULT_HASHED_PASSWORD_SALT
    }

    /// Socket address the HTTP server binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid bind address {}:{}",
                    self.server.host, self.server.port
                )
            })
    }
}
