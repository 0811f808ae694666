// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the `DeviceHub` REST server.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;

use crate::auth::{AuthService, DefaultAuth};
use crate::config::Settings;
use crate::storage::{FlatFileStorage, Storage};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState<S> {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Storage backend
    pub storage: S,
    /// Configuration settings
    pub settings: Arc<Settings>,
}

impl<S: Storage> AppState<S> {
    /// Create a new application state
    pub fn new(storage: S, config: &Settings) -> Self {
        let auth = Arc::new(DefaultAuth::new(storage.clone(), &config.auth));

        Self {
            auth,
            storage,
            settings: Arc::new(config.clone()),
        }
    }
}

impl AppState<FlatFileStorage> {
    /// Create an application state backed by the flat-file store in `settings.storage.path`
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let storage = FlatFileStorage::new(&settings.storage.path)?;
        Ok(Self::new(storage, settings))
    }
}
