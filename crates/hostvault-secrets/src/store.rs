//! The secret store.
//!
//! [`SecretStore`] owns the in-memory [`SecretDocument`], picks a backend for
//! each write, dispatches reads on the entry's scheme, and migrates legacy
//! entries. One instance is created per process and shared through
//! [`crate::SecretsContext`]; it starts uninitialized and every operation
//! fails with [`SecretError::NotInitialized`] until [`SecretStore::initialize`]
//! has completed.
//!
//! Routine failures never raise. Reads report them through [`SecretLookup`],
//! writes through their boolean result, and both log the cause.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hostvault_core::config::{Config, LegacyConfig};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::backend::{
    GcmBackend, LegacyBackend, PlainBackend, SecretDecryptor, SecretEncryptor, SodiumBackend,
    SodiumLibrary,
};
use crate::error::{Result, SecretError};
use crate::machine::MachineKey;
use crate::persist;
use crate::safe_storage::{KeychainSafeStorage, SafeStorage};
use crate::types::{
    DecryptedSecret, MigrationFailure, MigrationReport, Scheme, SecretDocument, SecretEntry,
    SecretLookup, StoreStatus,
};

/// Optional facilities found (or injected) at startup.
#[derive(Clone, Default)]
pub struct StoreCapabilities {
    sodium: Option<SodiumLibrary>,
    safe_storage: Option<Arc<dyn SafeStorage>>,
}

impl StoreCapabilities {
    /// No optional facility: writes use AES-GCM and legacy entries are unreadable.
    pub fn none() -> Self {
        Self::default()
    }

    /// Probe the host for libsodium and the platform safe storage.
    pub fn detect(legacy: &LegacyConfig) -> Self {
        Self {
            sodium: SodiumLibrary::load(),
            safe_storage: KeychainSafeStorage::detect(legacy),
        }
    }

    /// Probe according to `config` (`store.prefer_sodium`, `legacy.*`).
    pub fn from_config(config: &Config) -> Self {
        let mut capabilities = Self::detect(&config.legacy);
        if !config.store.prefer_sodium {
            capabilities.sodium = None;
        }
        capabilities
    }

    /// Try to load libsodium.
    pub fn with_sodium(mut self) -> Self {
        self.sodium = SodiumLibrary::load();
        self
    }

    pub fn without_sodium(mut self) -> Self {
        self.sodium = None;
        self
    }

    pub fn with_safe_storage(mut self, storage: Arc<dyn SafeStorage>) -> Self {
        self.safe_storage = Some(storage);
        self
    }

    pub fn without_safe_storage(mut self) -> Self {
        self.safe_storage = None;
        self
    }

    pub fn has_sodium(&self) -> bool {
        self.sodium.is_some()
    }

    pub fn has_safe_storage(&self) -> bool {
        self.safe_storage.is_some()
    }
}

impl fmt::Debug for StoreCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCapabilities")
            .field("sodium", &self.has_sodium())
            .field("safe_storage", &self.has_safe_storage())
            .finish()
    }
}

/// State of an initialized store.
struct Ready {
    path: PathBuf,
    sodium: Option<SodiumBackend>,
    fallback: GcmBackend,
    legacy: Option<LegacyBackend>,
    document: SecretDocument,
}

impl Ready {
    /// The backend new secrets are written with.
    fn writer(&self) -> &dyn SecretEncryptor {
        match &self.sodium {
            Some(sodium) => sodium,
            None => &self.fallback,
        }
    }

    /// The backend able to open `scheme`, if it is loaded.
    fn reader(&self, scheme: Scheme) -> Option<&dyn SecretDecryptor> {
        match scheme {
            Scheme::Sodium => self.sodium.as_ref().map(|b| b as &dyn SecretDecryptor),
            Scheme::Crypto => Some(&self.fallback),
            Scheme::Legacy => self.legacy.as_ref().map(|b| b as &dyn SecretDecryptor),
            Scheme::Plain => Some(&PlainBackend),
        }
    }

    fn open(&self, key: &str, entry: &SecretEntry) -> SecretLookup {
        let scheme = entry.scheme();
        let Some(reader) = self.reader(scheme) else {
            warn!(key, %scheme, "secret exists but its backend is unavailable");
            return SecretLookup::BackendUnavailable { scheme };
        };

        let plaintext = match reader.decrypt(&entry.data) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) => {
                warn!(key, %scheme, "failed to decrypt secret: {e}");
                return SecretLookup::DecryptFailed {
                    reason: e.to_string(),
                };
            }
        };

        match std::str::from_utf8(&plaintext) {
            Ok(value) => SecretLookup::Found(DecryptedSecret::new(value)),
            Err(e) => {
                warn!(key, %scheme, "decrypted secret is not valid UTF-8");
                SecretLookup::DecryptFailed {
                    reason: format!("invalid UTF-8: {e}"),
                }
            }
        }
    }

    /// Write the document, logging instead of failing.
    async fn persist(&self) -> bool {
        match persist::save_document(&self.path, &self.document).await {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), "failed to persist secret document: {e}");
                false
            }
        }
    }
}

enum State {
    Uninitialized,
    Ready(Box<Ready>),
}

impl State {
    fn ready(&self) -> Result<&Ready> {
        match self {
            State::Ready(ready) => Ok(ready),
            State::Uninitialized => Err(SecretError::NotInitialized),
        }
    }

    fn ready_mut(&mut self) -> Result<&mut Ready> {
        match self {
            State::Ready(ready) => Ok(ready),
            State::Uninitialized => Err(SecretError::NotInitialized),
        }
    }
}

/// Machine-bound encrypted secret store backed by a single JSON document.
pub struct SecretStore {
    state: RwLock<State>,
}

impl Default for SecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore {
    /// Create an uninitialized store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::Uninitialized),
        }
    }

    /// Initialize against the document at `path`, probing the host for the
    /// optional facilities with default settings.
    pub async fn initialize(&self, path: impl Into<PathBuf>) {
        let capabilities = StoreCapabilities::detect(&LegacyConfig::default());
        self.initialize_with(path, capabilities).await;
    }

    /// Initialize with explicit capabilities.
    ///
    /// Never fails: every missing facility downgrades what the store can do.
    /// Calling this again discards the previous in-memory state.
    pub async fn initialize_with(&self, path: impl Into<PathBuf>, capabilities: StoreCapabilities) {
        let path = path.into();
        let key = MachineKey::for_this_machine();

        let sodium = capabilities
            .sodium
            .map(|library| SodiumBackend::new(library, &key));
        if sodium.is_none() {
            warn!("libsodium unavailable; new secrets will use AES-GCM and sodium entries are unreadable");
        }
        let legacy = capabilities.safe_storage.map(LegacyBackend::new);
        let fallback = GcmBackend::new(&key);
        drop(key);

        let document = persist::load_document(&path).await;
        info!(
            path = %path.display(),
            entries = document.len(),
            sodium = sodium.is_some(),
            safe_storage = legacy.is_some(),
            "secret store initialized"
        );

        *self.state.write().await = State::Ready(Box::new(Ready {
            path,
            sodium,
            fallback,
            legacy,
            document,
        }));
    }

    pub async fn is_initialized(&self) -> bool {
        matches!(*self.state.read().await, State::Ready(_))
    }

    /// Encrypt and store `plaintext` under `key`, then persist the document.
    ///
    /// Returns `Ok(false)` when encryption or the write to disk failed; the
    /// cause is logged. An empty key or value is a [`SecretError::Validation`].
    pub async fn set_secret(&self, key: &str, plaintext: &str) -> Result<bool> {
        if key.is_empty() {
            return Err(SecretError::Validation(
                "secret key must not be empty".to_string(),
            ));
        }
        if plaintext.is_empty() {
            return Err(SecretError::Validation(
                "secret value must not be empty".to_string(),
            ));
        }

        let mut state = self.state.write().await;
        let ready = state.ready_mut()?;

        let writer = ready.writer();
        let method = writer.method();
        let data = match writer.encrypt(plaintext.as_bytes()) {
            Ok(data) => data,
            Err(e) => {
                warn!(key, %method, "failed to encrypt secret: {e}");
                return Ok(false);
            }
        };

        ready.document.insert(key, SecretEntry::sealed(method, data));
        debug!(key, %method, "stored secret");
        Ok(ready.persist().await)
    }

    /// Decrypt the secret stored under `key`.
    pub async fn get_secret(&self, key: &str) -> Result<SecretLookup> {
        let state = self.state.read().await;
        let ready = state.ready()?;

        Ok(match ready.document.get(key) {
            Some(entry) => ready.open(key, entry),
            None => SecretLookup::NotFound,
        })
    }

    /// Whether `key` exists and the backend needed to open it is loaded.
    ///
    /// Does not attempt decryption.
    pub async fn has_secret(&self, key: &str) -> Result<bool> {
        let state = self.state.read().await;
        let ready = state.ready()?;

        Ok(ready
            .document
            .get(key)
            .is_some_and(|entry| ready.reader(entry.scheme()).is_some()))
    }

    /// Remove `key`. Returns whether it existed.
    pub async fn delete_secret(&self, key: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        let ready = state.ready_mut()?;

        if ready.document.remove(key).is_none() {
            return Ok(false);
        }
        debug!(key, "deleted secret");
        ready.persist().await;
        Ok(true)
    }

    /// Remove every secret. Returns whether the empty document was written.
    pub async fn clear(&self) -> Result<bool> {
        let mut state = self.state.write().await;
        let ready = state.ready_mut()?;

        let removed = ready.document.len();
        ready.document.clear();
        debug!(removed, "cleared secret document");
        Ok(ready.persist().await)
    }

    /// Every stored key, readable or not, in sorted order.
    pub async fn get_keys(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        Ok(state.ready()?.document.keys().cloned().collect())
    }

    /// Re-encrypt every legacy entry with libsodium.
    ///
    /// Entries that cannot be opened or re-sealed stay untouched and are
    /// listed in [`MigrationReport::failed`]. The document is written once,
    /// and only if something was migrated.
    pub async fn migrate_to_sodium(&self) -> Result<MigrationReport> {
        let mut state = self.state.write().await;
        let ready = state.ready_mut()?;

        let mut report = MigrationReport::default();
        let legacy_keys = ready.document.legacy_keys();
        if legacy_keys.is_empty() {
            debug!("no legacy secrets to migrate");
            return Ok(report);
        }

        let unavailable = match (&ready.sodium, &ready.legacy) {
            (None, _) => Some("sodium backend unavailable"),
            (_, None) => Some("platform safe storage unavailable"),
            _ => None,
        };
        if let Some(reason) = unavailable {
            warn!(count = legacy_keys.len(), "cannot migrate legacy secrets: {reason}");
            report.failed = legacy_keys
                .into_iter()
                .map(|key| MigrationFailure {
                    key,
                    reason: reason.to_string(),
                })
                .collect();
            return Ok(report);
        }

        for key in legacy_keys {
            match migrate_entry(ready, &key) {
                Ok(entry) => {
                    ready.document.insert(key.clone(), entry);
                    debug!(key, "migrated legacy secret");
                    report.migrated.push(key);
                }
                Err(e) => {
                    warn!(key, "failed to migrate legacy secret: {e}");
                    report.failed.push(MigrationFailure {
                        key,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !report.migrated.is_empty() {
            report.persisted = ready.persist().await;
        }

        info!(
            migrated = report.migrated.len(),
            failed = report.failed.len(),
            "legacy secret migration finished"
        );
        Ok(report)
    }

    /// Path of the secret document.
    pub async fn settings_path(&self) -> Result<PathBuf> {
        let state = self.state.read().await;
        Ok(state.ready()?.path.clone())
    }

    /// Backend availability and entry counts.
    pub async fn status(&self) -> Result<StoreStatus> {
        let state = self.state.read().await;
        let ready = state.ready()?;

        Ok(StoreStatus {
            path: ready.path.clone(),
            sodium_available: ready.sodium.is_some(),
            safe_storage_available: ready.legacy.is_some(),
            write_method: ready.writer().method(),
            entries: ready.document.scheme_counts(),
        })
    }
}

/// Open a legacy entry with the safe storage and seal it with libsodium.
fn migrate_entry(ready: &Ready, key: &str) -> Result<SecretEntry> {
    let (Some(sodium), Some(legacy)) = (&ready.sodium, &ready.legacy) else {
        return Err(SecretError::EncryptionFailed(
            "migration backends not loaded".to_string(),
        ));
    };
    let entry = ready
        .document
        .get(key)
        .ok_or_else(|| SecretError::Validation(format!("no entry for {key}")))?;

    let plaintext = Zeroizing::new(legacy.decrypt(&entry.data)?);
    let data = sodium.encrypt(&plaintext)?;
    Ok(SecretEntry::sealed(sodium.method(), data))
}

/// Convenience for callers that only hold a path.
pub async fn open_store(path: &Path, capabilities: StoreCapabilities) -> SecretStore {
    let store = SecretStore::new();
    store.initialize_with(path, capabilities).await;
    store
}
