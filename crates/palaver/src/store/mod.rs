//! Credential persistence.
//!
//! The client never talks to a storage backend directly; it goes through a
//! [`CredentialStore`], which reads and writes whole [`CredentialPair`]s.
//! Implementations backed by a flat key-value map can use the helpers here
//! to stay compatible with the stable key layout.

mod memory;

use std::collections::BTreeMap;

use tracing::warn;

use crate::auth::{AccessToken, CredentialPair, RefreshToken};
use crate::error::StoreError;

pub use memory::MemoryStore;

/// Key holding the access token.
pub const ACCESS_KEY: &str = "access_token";

/// Key holding the refresh token.
pub const REFRESH_KEY: &str = "refresh_token";

/// Keys written by earlier client versions. Removed whenever the session is cleared.
pub const LEGACY_KEYS: [&str; 8] = [
    "chatgpt_user",
    "username",
    "user_id",
    "role",
    "access",
    "refresh",
    "name",
    "email",
];

/// Persistent storage for the session's credential pair.
pub trait CredentialStore: Send + Sync {
    /// Load the stored pair, or `None` for an anonymous session.
    fn load(&self) -> Result<Option<CredentialPair>, StoreError>;

    /// Replace the stored pair.
    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError>;

    /// Remove both credentials and any legacy keys. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), StoreError>;

    /// Store `next` only if the current pair still holds `expected` as its
    /// refresh token, as one atomic step. Returns whether it was written.
    ///
    /// A session cleared or replaced while a refresh was in flight is left
    /// as it is.
    fn replace_if(
        &self,
        expected: &RefreshToken,
        next: &CredentialPair,
    ) -> Result<bool, StoreError>;
}

/// Read a pair out of a key-value map.
///
/// A map holding only one of the two keys is treated as anonymous.
pub fn read_pair(entries: &BTreeMap<String, String>) -> Option<CredentialPair> {
    match (entries.get(ACCESS_KEY), entries.get(REFRESH_KEY)) {
        (Some(access), Some(refresh)) => Some(CredentialPair::new(
            AccessToken::new(access.clone()),
            RefreshToken::new(refresh.clone()),
        )),
        (None, None) => None,
        _ => {
            warn!("Ignoring half-stored credential pair");
            None
        }
    }
}

/// Write both keys of a pair into a key-value map.
pub fn write_pair(entries: &mut BTreeMap<String, String>, pair: &CredentialPair) {
    entries.insert(ACCESS_KEY.to_string(), pair.access.as_str().to_string());
    entries.insert(REFRESH_KEY.to_string(), pair.refresh.as_str().to_string());
}

/// Write `next` into a key-value map if its refresh token is still `expected`.
pub fn replace_pair_if(
    entries: &mut BTreeMap<String, String>,
    expected: &RefreshToken,
    next: &CredentialPair,
) -> bool {
    let current = read_pair(entries);
    if current.as_ref().is_none_or(|pair| &pair.refresh != expected) {
        return false;
    }
    write_pair(entries, next);
    true
}

/// Remove the credential keys and every legacy key from a key-value map.
pub fn remove_session_keys(entries: &mut BTreeMap<String, String>) {
    entries.remove(ACCESS_KEY);
    entries.remove(REFRESH_KEY);
    for key in LEGACY_KEYS {
        entries.remove(key);
    }
}
