//! Credential store.
//!
//! Persists the single set of login credentials and the last-known profile.
//! A stored credential is what makes the client "logged in"; its absence
//! means logged out.
//!
//! # Failure policy
//!
//! Nothing here returns an error. Corrupt or unreadable slots load as
//! absent, and failed writes are logged. Callers always get a usable answer
//! and the worst case is being treated as logged out.

use std::fmt;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use icycon_core::{Identifier, Profile};
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::storage::{MemoryStorage, Storage};

/// Storage key holding `{identifier, secret}`.
pub const CREDENTIALS_KEY: &str = "icycon.credentials";

/// Storage key holding the cached profile snapshot.
pub const PROFILE_KEY: &str = "icycon.profile";

/// Login credentials sent with every authenticated request.
///
/// The secret is the user's plaintext password; HTTP Basic needs it on
/// every call.
#[derive(Clone)]
pub struct Credentials {
    pub identifier: Identifier,
    pub secret: SecretString,
}

impl Credentials {
    /// Create credentials from an identifier and password.
    #[must_use]
    pub fn new(identifier: Identifier, secret: impl Into<SecretString>) -> Self {
        Self {
            identifier,
            secret: secret.into(),
        }
    }

    /// `Authorization` header value: `Basic base64(identifier:secret)`.
    #[must_use]
    pub fn basic_auth_header(&self) -> SecretString {
        let raw = format!("{}:{}", self.identifier, self.secret.expose_secret());
        SecretString::from(format!("Basic {}", STANDARD.encode(raw)))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.secret.expose_secret() == other.secret.expose_secret()
    }
}

impl Eq for Credentials {}

/// Everything persisted for a logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub credentials: Credentials,
    pub cached_profile: Option<Profile>,
}

impl CredentialRecord {
    #[must_use]
    pub const fn new(credentials: Credentials, cached_profile: Option<Profile>) -> Self {
        Self {
            credentials,
            cached_profile,
        }
    }
}

/// On-disk shape of the credential slot.
#[derive(Serialize, Deserialize)]
struct StoredCredentials {
    identifier: Identifier,
    secret: String,
}

/// Durable home of the one [`CredentialRecord`].
///
/// Read-modify-write sequences run under an internal mutex so the store can
/// be shared between the session and concurrent requests.
pub struct CredentialStore {
    storage: Arc<dyn Storage>,
    lock: Mutex<()>,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Create a store over the given storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    /// Create a store that forgets everything when dropped.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Load the stored record, or `None` if absent or corrupt.
    pub fn load(&self) -> Option<CredentialRecord> {
        let _guard = self.lock.lock();
        let credentials = self.read_credentials()?;
        Some(CredentialRecord::new(credentials, self.read_profile()))
    }

    /// Whether a (readable) credential is stored.
    pub fn is_present(&self) -> bool {
        let _guard = self.lock.lock();
        self.read_credentials().is_some()
    }

    /// Derive the Basic auth header from the stored credential, if any.
    pub fn auth_header(&self) -> Option<SecretString> {
        let _guard = self.lock.lock();
        self.read_credentials()
            .map(|credentials| credentials.basic_auth_header())
    }

    /// Overwrite the stored record.
    ///
    /// Writes the credential slot, then writes or removes the profile slot so
    /// that a later `load` returns exactly `record`. The two writes are not
    /// rolled back on partial failure; both are idempotent overwrites.
    pub fn save(&self, record: &CredentialRecord) {
        let _guard = self.lock.lock();

        let stored = StoredCredentials {
            identifier: record.credentials.identifier.clone(),
            secret: record.credentials.secret.expose_secret().to_string(),
        };
        match serde_json::to_string(&stored) {
            Ok(json) => self.write(CREDENTIALS_KEY, &json),
            Err(e) => tracing::warn!(error = %e, "Failed to encode credentials"),
        }

        match &record.cached_profile {
            Some(profile) => self.write_profile(profile),
            None => self.delete(PROFILE_KEY),
        }
    }

    /// Replace only the cached profile.
    ///
    /// Does nothing and returns `false` when no credential is stored, so a
    /// late profile fetch cannot resurrect a logged-out user's data.
    pub fn save_profile(&self, profile: &Profile) -> bool {
        let _guard = self.lock.lock();
        if self.read_credentials().is_none() {
            return false;
        }
        self.write_profile(profile);
        true
    }

    /// Remove the credential and profile slots. Safe to call when empty.
    pub fn clear(&self) {
        let _guard = self.lock.lock();
        self.delete(CREDENTIALS_KEY);
        self.delete(PROFILE_KEY);
    }

    // =========================================================================
    // Unlocked helpers (caller holds `lock`)
    // =========================================================================

    fn read_credentials(&self) -> Option<Credentials> {
        let raw = self.read(CREDENTIALS_KEY)?;
        match serde_json::from_str::<StoredCredentials>(&raw) {
            Ok(stored) => Some(Credentials::new(stored.identifier, stored.secret)),
            Err(e) => {
                tracing::warn!(error = %e, "Stored credentials are corrupt, treating as logged out");
                None
            }
        }
    }

    fn read_profile(&self) -> Option<Profile> {
        let raw = self.read(PROFILE_KEY)?;
        match serde_json::from_str::<Profile>(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "Cached profile is corrupt, ignoring it");
                None
            }
        }
    }

    fn write_profile(&self, profile: &Profile) {
        match serde_json::to_string(profile) {
            Ok(json) => self.write(PROFILE_KEY, &json),
            Err(e) => tracing::warn!(error = %e, "Failed to encode profile"),
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read storage");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            tracing::warn!(key, error = %e, "Failed to write storage");
        }
    }

    fn delete(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            tracing::warn!(key, error = %e, "Failed to remove storage key");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use icycon_core::UserId;

    fn credentials(identifier: &str, secret: &str) -> Credentials {
        Credentials::new(Identifier::parse(identifier).unwrap(), secret)
    }

    fn profile() -> Profile {
        Profile {
            id: UserId::new(42),
            email: "a@b.com".to_string(),
            username: "ab".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
            avatar: None,
            plan: Some("growth".to_string()),
            region: None,
            brand_tone: None,
        }
    }

    fn store_with_backend() -> (CredentialStore, Arc<MemoryStorage>) {
        let backend = Arc::new(MemoryStorage::new());
        (CredentialStore::new(backend.clone()), backend)
    }

    #[test]
    fn test_basic_auth_header() {
        let header = credentials("a@b.com", "pw").basic_auth_header();
        assert_eq!(header.expose_secret(), "Basic YUBiLmNvbTpwdw==");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", credentials("a@b.com", "hunter2"));
        assert!(debug.contains("a@b.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_round_trip_with_profile() {
        let store = CredentialStore::in_memory();
        let record = CredentialRecord::new(credentials("a@b.com", "pw"), Some(profile()));
        store.save(&record);
        assert_eq!(store.load(), Some(record));
    }

    #[test]
    fn test_round_trip_without_profile() {
        let store = CredentialStore::in_memory();
        store.save(&CredentialRecord::new(
            credentials("a@b.com", "old"),
            Some(profile()),
        ));

        let record = CredentialRecord::new(credentials("username", "p:w with spaces"), None);
        store.save(&record);
        assert_eq!(store.load(), Some(record));
    }

    #[test]
    fn test_load_empty_is_none() {
        let store = CredentialStore::in_memory();
        assert!(store.load().is_none());
        assert!(!store.is_present());
        assert!(store.auth_header().is_none());
    }

    #[test]
    fn test_corrupt_credentials_load_as_absent() {
        let (store, backend) = store_with_backend();
        backend.set(CREDENTIALS_KEY, "not json at all {").unwrap();
        assert!(store.load().is_none());

        backend
            .set(CREDENTIALS_KEY, r#"{"identifier":"a:b","secret":"pw"}"#)
            .unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_profile_keeps_credentials() {
        let (store, backend) = store_with_backend();
        store.save(&CredentialRecord::new(credentials("a@b.com", "pw"), None));
        backend.set(PROFILE_KEY, "{{{").unwrap();

        let record = store.load().unwrap();
        assert_eq!(record.credentials, credentials("a@b.com", "pw"));
        assert!(record.cached_profile.is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (store, backend) = store_with_backend();
        store.clear();

        store.save(&CredentialRecord::new(
            credentials("a@b.com", "pw"),
            Some(profile()),
        ));
        store.clear();
        store.clear();

        assert!(store.load().is_none());
        assert!(backend.is_empty());
    }

    #[test]
    fn test_save_profile_requires_credentials() {
        let store = CredentialStore::in_memory();
        assert!(!store.save_profile(&profile()));
        assert!(store.load().is_none());

        store.save(&CredentialRecord::new(credentials("a@b.com", "pw"), None));
        assert!(store.save_profile(&profile()));
        assert_eq!(store.load().unwrap().cached_profile, Some(profile()));
    }

    #[test]
    fn test_file_backed_store_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        let record = CredentialRecord::new(credentials("a@b.com", "pw"), Some(profile()));

        CredentialStore::new(Arc::new(crate::storage::FileStorage::new(tmp.path()))).save(&record);

        let reopened = CredentialStore::new(Arc::new(crate::storage::FileStorage::new(tmp.path())));
        assert_eq!(reopened.load(), Some(record));
    }
}
