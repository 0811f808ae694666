// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Storage abstraction with in-memory and flat-file implementations.
//!
//! The auth core only ever sees [`UserStore`]; device routes use
//! [`DeviceStore`]. Both are implemented by [`MemoryStorage`] (tests) and
//! [`FlatFileStorage`] (one JSON document per record).
use crate::error::AppError;
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use devicehub_common::{AuthenticatedUser, DeviceDto, UpdateDeviceCommand};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    fmt,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs as tokio_fs, io::AsyncWriteExt, sync::Mutex};
use uuid::Uuid;

/// Stored user document: credential plus profile
#[derive(Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub password_digest: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_digest", &"<redacted>")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl UserRecord {
    /// Profile view without the digest
    pub fn to_authenticated_user(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Partial device update
#[derive(Debug, Clone, Default)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl DevicePatch {
    pub fn activation(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    fn apply(self, device: &mut DeviceDto) {
        if let Some(name) = self.name {
            device.name = name;
        }
        if let Some(address) = self.address {
            device.address = address;
        }
        if let Some(is_active) = self.is_active {
            device.is_active = is_active;
        }
        device.updated_at = Utc::now();
    }
}

impl From<UpdateDeviceCommand> for DevicePatch {
    fn from(cmd: UpdateDeviceCommand) -> Self {
        Self {
            name: cmd.name,
            address: cmd.address,
            is_active: None,
        }
    }
}

/// Credential store keyed by username
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look a user up by username
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError>;

    /// Persist a new user; fails if the username is taken
    async fn insert_user(&self, user: UserRecord) -> Result<(), AppError>;
}

/// Device document store
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<DeviceDto>, AppError>;

    async fn get_device(&self, id: &str) -> Result<Option<DeviceDto>, AppError>;

    async fn insert_device(&self, device: DeviceDto) -> Result<(), AppError>;

    /// Apply a patch, returning the updated device or `None` if absent
    async fn update_device(
        &self,
        id: &str,
        patch: DevicePatch,
    ) -> Result<Option<DeviceDto>, AppError>;

    /// Delete a device, returning what was removed
    async fn remove_device(&self, id: &str) -> Result<Option<DeviceDto>, AppError>;
}

/// Everything the HTTP layer needs from a backend
pub trait Storage: UserStore + DeviceStore + Clone + 'static {}

impl<T> Storage for T where T: UserStore + DeviceStore + Clone + 'static {}

fn duplicate_user(username: &str) -> AppError {
    AppError::Store(format!("user {username:?} already exists"))
}

fn sort_devices(devices: &mut [DeviceDto]) {
    devices.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// In-memory implementation of the storage traits
#[derive(Clone, Default)]
pub struct MemoryStorage {
    users: Arc<DashMap<String, UserRecord>>,
    devices: Arc<DashMap<String, DeviceDto>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a user outright. There is no HTTP route for this; it exists so
    /// tokens outliving their principal can be exercised.
    pub fn remove_user(&self, username: &str) -> Option<UserRecord> {
        self.users.remove(username).map(|(_, user)| user)
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError> {
        Ok(self.users.get(username).map(|user| user.value().clone()))
    }

    async fn insert_user(&self, user: UserRecord) -> Result<(), AppError> {
        match self.users.entry(user.username.clone()) {
            Entry::Occupied(_) => Err(duplicate_user(&user.username)),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            },
        }
    }
}

#[async_trait]
impl DeviceStore for MemoryStorage {
    async fn list_devices(&self) -> Result<Vec<DeviceDto>, AppError> {
        let mut devices: Vec<DeviceDto> = self.devices.iter().map(|d| d.value().clone()).collect();
        sort_devices(&mut devices);
        Ok(devices)
    }

    async fn get_device(&self, id: &str) -> Result<Option<DeviceDto>, AppError> {
        Ok(self.devices.get(id).map(|d| d.value().clone()))
    }

    async fn insert_device(&self, device: DeviceDto) -> Result<(), AppError> {
        self.devices.insert(device.id.clone(), device);
        Ok(())
    }

    async fn update_device(
        &self,
        id: &str,
        patch: DevicePatch,
    ) -> Result<Option<DeviceDto>, AppError> {
        Ok(self.devices.get_mut(id).map(|mut device| {
            patch.apply(device.value_mut());
            device.value().clone()
        }))
    }

    async fn remove_device(&self, id: &str) -> Result<Option<DeviceDto>, AppError> {
        Ok(self.devices.remove(id).map(|(_, device)| device))
    }
}

/// Flat-file implementation of the storage traits
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
    /// Serialises read-modify-write cycles on device documents
    device_lock: Arc<Mutex<()>>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("users"))?;
        std::fs::create_dir_all(root.join("devices"))?;
        Ok(Self {
            root,
            device_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Usernames are arbitrary text of any length, so the file name is a
    /// fixed-length digest of the username rather than the username itself.
    fn user_path(&self, username: &str) -> PathBuf {
        let name = URL_SAFE_NO_PAD.encode(Sha256::digest(username.as_bytes()));
        self.root.join("users").join(format!("{name}.json"))
    }

    /// Only server-issued UUIDs map to a file; anything else cannot exist.
    fn device_path(&self, id: &str) -> Option<PathBuf> {
        let id = Uuid::parse_str(id).ok()?;
        Some(self.root.join("devices").join(format!("{id}.json")))
    }

    async fn read_device(path: &Path) -> Result<Option<DeviceDto>, AppError> {
        match tokio_fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Callers hold `device_lock`, so one staging name per device is enough.
    async fn write_device(path: &Path, device: &DeviceDto) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(device)?;
        let staged = path.with_extension("json.tmp");
        write_staged(&staged, json.as_bytes()).await?;
        tokio_fs::rename(&staged, path).await?;
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        self.root
            .join("users")
            .join(format!(".{}.tmp", Uuid::new_v4().simple()))
    }
}

/// Write and sync `bytes` into a fresh staging file
async fn write_staged(staged: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio_fs::File::create(staged).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Publish a fully written staging file under `target` unless `target`
/// already exists. Readers see either no file or the complete document.
async fn publish_new(staged: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    write_staged(staged, bytes).await?;
    tokio_fs::hard_link(staged, target).await
}

#[async_trait]
impl UserStore for FlatFileStorage {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError> {
        match tokio_fs::read_to_string(self.user_path(username)).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The user document is staged in full, then hard-linked into place;
    /// the link fails if the username is already taken.
    async fn insert_user(&self, user: UserRecord) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(&user)?;
        let staged = self.staging_path();

        let published = publish_new(&staged, &self.user_path(&user.username), json.as_bytes()).await;
        if let Err(e) = tokio_fs::remove_file(&staged).await {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %staged.display(), error = %e, "failed to remove staged user file");
            }
        }

        match published {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(duplicate_user(&user.username)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl DeviceStore for FlatFileStorage {
    async fn list_devices(&self) -> Result<Vec<DeviceDto>, AppError> {
        let mut devices = Vec::new();
        let mut entries = tokio_fs::read_dir(self.root.join("devices")).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(device) = Self::read_device(&path).await? {
                devices.push(device);
            }
        }

        sort_devices(&mut devices);
        Ok(devices)
    }

    async fn get_device(&self, id: &str) -> Result<Option<DeviceDto>, AppError> {
        match self.device_path(id) {
            Some(path) => Self::read_device(&path).await,
            None => Ok(None),
        }
    }

    async fn insert_device(&self, device: DeviceDto) -> Result<(), AppError> {
        let path = self
            .device_path(&device.id)
            .ok_or_else(|| AppError::Store(format!("invalid device id {:?}", device.id)))?;

        let _guard = self.device_lock.lock().await;
        Self::write_device(&path, &device).await
    }

    async fn update_device(
        &self,
        id: &str,
        patch: DevicePatch,
    ) -> Result<Option<DeviceDto>, AppError> {
        let Some(path) = self.device_path(id) else {
            return Ok(None);
        };

        let _guard = self.device_lock.lock().await;
        let Some(mut device) = Self::read_device(&path).await? else {
            return Ok(None);
        };

        patch.apply(&mut device);
        Self::write_device(&path, &device).await?;
        Ok(Some(device))
    }

    async fn remove_device(&self, id: &str) -> Result<Option<DeviceDto>, AppError> {
        let Some(path) = self.device_path(id) else {
            return Ok(None);
        };

        let _guard = self.device_lock.lock().await;
        let Some(device) = Self::read_device(&path).await? else {
            return Ok(None);
        };

        tokio_fs::remove_file(&path).await?;
        Ok(Some(device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn user(username: &str) -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_digest: "digest".to_string(),
            firstname: "Test".to_string(),
            lastname: "User".to_string(),
            email: format!("{username}@example.com"),
            created_at: now,
            updated_at: now,
        }
    }

    fn device(name: &str) -> DeviceDto {
        let now = Utc::now();
        DeviceDto {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            address: "10.10.10.10".to_string(),
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_memory_users_are_unique() {
        let storage = MemoryStorage::new();
        storage.insert_user(user("tester")).await.unwrap();

        let err = storage.insert_user(user("tester")).await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));

        let found = storage.find_by_username("tester").await.unwrap().unwrap();
        assert_eq!(found.email, "tester@example.com");
        assert!(storage.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_device_patch() {
        let storage = MemoryStorage::new();
        let created = device("router");
        storage.insert_device(created.clone()).await.unwrap();

        let updated = storage
            .update_device(&created.id, DevicePatch::activation(true))
            .await
            .unwrap()
            .unwrap();
        assert!(updated.is_active);
        assert_eq!(updated.name, "router");
        assert!(updated.updated_at >= created.updated_at);

        assert!(storage
            .update_device("missing", DevicePatch::default())
            .await
            .unwrap()
            .is_none());

        let removed = storage.remove_device(&created.id).await.unwrap().unwrap();
        assert_eq!(removed.id, created.id);
        assert!(storage.list_devices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flat_file_users() {
        let temp_dir = tempdir().unwrap();
        let storage = FlatFileStorage::new(temp_dir.path()).unwrap();

        // Path separators in usernames must not escape the users directory
        storage.insert_user(user("../evil/name")).await.unwrap();
        storage.insert_user(user("tester")).await.unwrap();
        assert!(matches!(
            storage.insert_user(user("tester")).await.unwrap_err(),
            AppError::Store(_)
        ));

        let found = storage.find_by_username("../evil/name").await.unwrap().unwrap();
        assert_eq!(found.username, "../evil/name");
        assert_eq!(std::fs::read_dir(temp_dir.path().join("users")).unwrap().count(), 2);

        // Survives a reopen
        let reopened = FlatFileStorage::new(temp_dir.path()).unwrap();
        assert!(reopened.find_by_username("tester").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_flat_file_long_usernames() {
        let temp_dir = tempdir().unwrap();
        let storage = FlatFileStorage::new(temp_dir.path()).unwrap();
        let long_name = "u".repeat(300);

        assert!(storage.find_by_username(&long_name).await.unwrap().is_none());

        storage.insert_user(user(&long_name)).await.unwrap();
        let found = storage.find_by_username(&long_name).await.unwrap().unwrap();
        assert_eq!(found.username, long_name);
        assert!(matches!(
            storage.insert_user(user(&long_name)).await.unwrap_err(),
            AppError::Store(_)
        ));
    }

    #[tokio::test]
    async fn test_flat_file_insert_leaves_no_staging_files() {
        let temp_dir = tempdir().unwrap();
        let storage = FlatFileStorage::new(temp_dir.path()).unwrap();

        storage.insert_user(user("tester")).await.unwrap();
        assert!(storage.insert_user(user("tester")).await.is_err());

        let names: Vec<String> = std::fs::read_dir(temp_dir.path().join("users"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".json"));

        // The published document is complete and parseable
        let content = std::fs::read_to_string(storage.user_path("tester")).unwrap();
        let stored: UserRecord = serde_json::from_str(&content).unwrap();
        assert_eq!(stored.username, "tester");
    }

    #[tokio::test]
    async fn test_flat_file_device_writes_leave_no_staging_files() {
        let temp_dir = tempdir().unwrap();
        let storage = FlatFileStorage::new(temp_dir.path()).unwrap();

        let created = device("router");
        storage.insert_device(created.clone()).await.unwrap();
        storage
            .update_device(&created.id, DevicePatch::activation(true))
            .await
            .unwrap();

        let count = std::fs::read_dir(temp_dir.path().join("devices")).unwrap().count();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_flat_file_devices() {
        let temp_dir = tempdir().unwrap();
        let storage = FlatFileStorage::new(temp_dir.path()).unwrap();

        let first = device("router");
        let second = device("switch");
        storage.insert_device(first.clone()).await.unwrap();
        storage.insert_device(second.clone()).await.unwrap();
        assert_eq!(storage.list_devices().await.unwrap().len(), 2);

        let patch = DevicePatch::from(UpdateDeviceCommand {
            name: None,
            address: Some("192.168.0.1".to_string()),
        });
        let updated = storage.update_device(&first.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.address, "192.168.0.1");
        assert_eq!(
            storage.get_device(&first.id).await.unwrap().unwrap().address,
            "192.168.0.1"
        );

        assert!(storage.get_device("../../users/x").await.unwrap().is_none());
        assert!(storage.remove_device(&second.id).await.unwrap().is_some());
        assert!(storage.remove_device(&second.id).await.unwrap().is_none());
        assert_eq!(storage.list_devices().await.unwrap(), vec![updated]);
    }
}
