//! Preference and secret stores.
//!
//! Small scalar settings live in a [`Preferences`] store, credentials in a
//! [`SecretStore`]. Both are traits so the engine can run against in-memory
//! stores in tests and against a TOML file and the OS keychain in the binary.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Keychain service name.
pub const KEYRING_SERVICE: &str = "daily";

/// Named keys used across the workspace.
pub mod keys {
    /// Secret: Google credential (bearer token or OAuth token JSON).
    pub const CALENDAR_TOKEN: &str = "calendar-token";
    /// Secret: Mattermost personal access token.
    pub const MATTERMOST_TOKEN: &str = "mattermost-token";

    /// Preference: calendar to list.
    pub const CALENDAR_ID: &str = "calendar-id";
    /// Preference: minutes between forced refreshes.
    pub const CALENDAR_UPDATE_INTERVAL: &str = "calendar-update-interval";
    /// Preference: incremental sync token of the last refresh.
    pub const SYNC_TOKEN: &str = "sync-token";
    /// Preference: reminder lead time in minutes.
    pub const NOTIFICATION_TIME: &str = "notification-time";
    /// Preference: Mattermost server host or URL.
    pub const MATTERMOST_SERVER: &str = "mattermost-server";

    pub const ALL_PREFERENCES: &[&str] = &[
        CALENDAR_ID,
        CALENDAR_UPDATE_INTERVAL,
        SYNC_TOKEN,
        NOTIFICATION_TIME,
        MATTERMOST_SERVER,
    ];
}

/// Credential storage keyed by name.
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Removing an absent key succeeds.
    fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Small scalar settings keyed by name.
pub trait Preferences: Send + Sync {
    fn get_string(&self, key: &str) -> StoreResult<Option<String>>;
    fn set_string(&self, key: &str, value: &str) -> StoreResult<()>;
    /// Removing an absent key succeeds.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Reads a non-negative integer, falling back when unset.
    fn get_u64_or(&self, key: &str, fallback: u64) -> StoreResult<u64> {
        match self.get_string(key)? {
            None => Ok(fallback),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| StoreError::invalid_value(key, value)),
        }
    }
}

impl<T: SecretStore + ?Sized> SecretStore for Arc<T> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        (**self).delete(key)
    }
}

impl<T: Preferences + ?Sized> Preferences for Arc<T> {
    fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get_string(key)
    }

    fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set_string(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        (**self).remove(key)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Secrets in the OS keychain.
#[derive(Debug, Clone)]
pub struct KeyringSecretStore {
    service: String,
}

impl Default for KeyringSecretStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl KeyringSecretStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl SecretStore for KeyringSecretStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entry = keyring::Entry::new(&self.service, key)?;
        match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let entry = keyring::Entry::new(&self.service, key)?;
        entry.set_password(value)?;
        debug!(key, "secret stored");
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let entry = keyring::Entry::new(&self.service, key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Secrets held in memory.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, key: &str, value: &str) -> Self {
        lock(&self.values).insert(key.to_string(), value.to_string());
        self
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(lock(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        lock(&self.values).remove(key);
        Ok(())
    }
}

/// Preferences held in memory.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        lock(&self.values).insert(key.to_string(), value.to_string());
        self
    }
}

impl Preferences for MemoryPreferences {
    fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(lock(&self.values).get(key).cloned())
    }

    fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        lock(&self.values).remove(key);
        Ok(())
    }
}

/// Preferences persisted as a flat TOML table.
///
/// The file is read once on open and rewritten on every change.
#[derive(Debug)]
pub struct TomlPreferences {
    path: PathBuf,
    values: Mutex<BTreeMap<String, toml::Value>>,
}

impl TomlPreferences {
    /// Default location: `~/.config/daily/preferences.toml`.
    pub fn default_path() -> StoreResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("daily").join("preferences.toml"))
            .ok_or(StoreError::NoConfigDir)
    }

    pub fn open_default() -> StoreResult<Self> {
        Self::open(Self::default_path()?)
    }

    /// Opens the file at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::io(&path, e)),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored values, rendered as strings.
    pub fn entries(&self) -> Vec<(String, String)> {
        lock(&self.values)
            .iter()
            .map(|(k, v)| (k.clone(), render(v)))
            .collect()
    }

    fn persist(&self, values: &BTreeMap<String, toml::Value>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let content = toml::to_string(values)?;
        std::fs::write(&self.path, content).map_err(|e| StoreError::io(&self.path, e))
    }
}

fn render(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Preferences for TomlPreferences {
    fn get_string(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(lock(&self.values).get(key).map(render))
    }

    fn set_string(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut values = lock(&self.values);
        values.insert(key.to_string(), toml::Value::String(value.to_string()));
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut values = lock(&self.values);
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_secrets() {
        let store = MemorySecretStore::new().with_secret(keys::CALENDAR_TOKEN, "tok");
        assert_eq!(store.get(keys::CALENDAR_TOKEN).unwrap().as_deref(), Some("tok"));
        store.delete(keys::CALENDAR_TOKEN).unwrap();
        assert!(store.get(keys::CALENDAR_TOKEN).unwrap().is_none());
        store.delete(keys::CALENDAR_TOKEN).unwrap();
    }

    #[test]
    fn integer_fallback_and_validation() {
        let prefs = MemoryPreferences::new().with_value(keys::NOTIFICATION_TIME, " 3 ");
        assert_eq!(prefs.get_u64_or(keys::NOTIFICATION_TIME, 1).unwrap(), 3);
        assert_eq!(prefs.get_u64_or(keys::CALENDAR_UPDATE_INTERVAL, 5).unwrap(), 5);

        prefs.set_string(keys::CALENDAR_UPDATE_INTERVAL, "soon").unwrap();
        assert!(matches!(
            prefs.get_u64_or(keys::CALENDAR_UPDATE_INTERVAL, 5),
            Err(StoreError::InvalidValue { .. })
        ));
    }

    #[test]
    fn toml_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("preferences.toml");

        let prefs = TomlPreferences::open(&path).unwrap();
        assert!(prefs.get_string(keys::CALENDAR_ID).unwrap().is_none());
        prefs.set_string(keys::CALENDAR_ID, "team@example.com").unwrap();
        prefs.set_string(keys::SYNC_TOKEN, "CPDAlvWDx70CEPDAlvWDx70CGAU=").unwrap();

        let reopened = TomlPreferences::open(&path).unwrap();
        assert_eq!(
            reopened.get_string(keys::CALENDAR_ID).unwrap().as_deref(),
            Some("team@example.com")
        );

        reopened.remove(keys::SYNC_TOKEN).unwrap();
        let reopened = TomlPreferences::open(&path).unwrap();
        assert!(reopened.get_string(keys::SYNC_TOKEN).unwrap().is_none());
    }

    #[test]
    fn toml_accepts_hand_written_integers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.toml");
        std::fs::write(&path, "calendar-update-interval = 10\nnotification-time = \"2\"\n").unwrap();

        let prefs = TomlPreferences::open(&path).unwrap();
        assert_eq!(prefs.get_u64_or(keys::CALENDAR_UPDATE_INTERVAL, 5).unwrap(), 10);
        assert_eq!(prefs.get_u64_or(keys::NOTIFICATION_TIME, 1).unwrap(), 2);

        let entries = prefs.entries();
        assert_eq!(entries[0], ("calendar-update-interval".to_string(), "10".to_string()));
    }

    #[test]
    fn toml_rejects_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.toml");
        std::fs::write(&path, "calendar-id = ").unwrap();
        assert!(matches!(
            TomlPreferences::open(&path),
            Err(StoreError::Parse { .. })
        ));
    }
}
