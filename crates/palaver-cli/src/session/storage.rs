//! Credentials file for persisting login state between invocations.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::debug;

use palaver::{CredentialPair, RefreshToken};
use palaver::error::StoreError;
use palaver::store::{self, CredentialStore};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Key-value credentials kept as a JSON object on disk.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// The credentials file under the platform data directory.
    pub fn default_location() -> Result<Self> {
        let dirs =
            ProjectDirs::from("", "", "palaver").context("Could not determine data directory")?;

        let data_dir = dirs.data_dir();
        fs::create_dir_all(data_dir).context("Failed to create data directory")?;

        Ok(Self::new(data_dir.join("credentials.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        if json.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&json).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        let json =
            serde_json::to_string_pretty(entries).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }

    /// Read-modify-write under the lock. Nothing is written when `change` returns false.
    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_entries()?;
        if !change(&mut entries) {
            return Ok(false);
        }
        self.write_entries(&entries)?;
        Ok(true)
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Result<Option<CredentialPair>, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(store::read_pair(&self.read_entries()?))
    }

    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        debug!(path = %self.path.display(), "Saving credentials");
        self.update(|entries| {
            store::write_pair(entries, pair);
            true
        })?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        debug!(path = %self.path.display(), "Clearing credentials");
        self.update(|entries| {
            store::remove_session_keys(entries);
            true
        })?;
        Ok(())
    }

    fn replace_if(
        &self,
        expected: &RefreshToken,
        next: &CredentialPair,
    ) -> Result<bool, StoreError> {
        self.update(|entries| store::replace_pair_if(entries, expected, next))
    }
}
