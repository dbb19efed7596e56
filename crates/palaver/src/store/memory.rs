//! In-memory credential store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::auth::{CredentialPair, RefreshToken};
use crate::error::StoreError;

use super::{CredentialStore, read_pair, remove_session_keys, replace_pair_if, write_pair};

/// A credential store kept in process memory.
///
/// Useful for tests and for embedders that persist credentials elsewhere.
/// It behaves like a small key-value store, so unrelated keys survive a clear.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds a session.
    pub fn with_pair(pair: &CredentialPair) -> Self {
        let store = Self::default();
        write_pair(&mut store.lock(), pair);
        store
    }

    /// Read a raw key.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Write a raw key.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<Option<CredentialPair>, StoreError> {
        Ok(read_pair(&self.lock()))
    }

    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        write_pair(&mut self.lock(), pair);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        remove_session_keys(&mut self.lock());
        Ok(())
    }

    fn replace_if(
        &self,
        expected: &RefreshToken,
        next: &CredentialPair,
    ) -> Result<bool, StoreError> {
        Ok(replace_pair_if(&mut self.lock(), expected, next))
    }
}
