//! Core types for secret management.
//!
//! The on-disk model ([`SecretDocument`] of [`SecretEntry`] values) and the
//! in-memory results the store hands back to callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroizing;

/// Encryption method tag written alongside every current entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// libsodium secretbox (XSalsa20-Poly1305).
    Sodium,
    /// AES-256-GCM fallback.
    Crypto,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Sodium => "sodium",
            Method::Crypto => "crypto",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an entry has to be opened, derived from its `encrypted`/`method` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Sodium,
    Crypto,
    /// `encrypted: true` without a method: written by the retired platform
    /// safe storage.
    Legacy,
    /// No `encrypted` flag: the value is only base64-wrapped.
    Plain,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Sodium => "sodium",
            Scheme::Crypto => "crypto",
            Scheme::Legacy => "legacy",
            Scheme::Plain => "plain",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for Scheme {
    fn from(method: Method) -> Self {
        match method {
            Method::Sodium => Scheme::Sodium,
            Method::Crypto => Scheme::Crypto,
        }
    }
}

/// A single stored secret.
///
/// `data` is always base64; its alphabet and byte layout depend on the scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretEntry {
    #[serde(default, skip_serializing_if = "is_false")]
    pub encrypted: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,

    pub data: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl SecretEntry {
    /// An entry produced by one of the current write paths.
    pub fn sealed(method: Method, data: String) -> Self {
        Self {
            encrypted: true,
            method: Some(method),
            data,
        }
    }

    pub fn scheme(&self) -> Scheme {
        match (self.method, self.encrypted) {
            (Some(method), _) => method.into(),
            (None, true) => Scheme::Legacy,
            (None, false) => Scheme::Plain,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.scheme() == Scheme::Legacy
    }
}

/// The whole persisted file: key -> entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretDocument {
    entries: BTreeMap<String, SecretEntry>,
}

impl SecretDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&SecretEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: SecretEntry) -> Option<SecretEntry> {
        self.entries.insert(key.into(), entry)
    }

    pub fn remove(&mut self, key: &str) -> Option<SecretEntry> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SecretEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys of every legacy entry.
    pub fn legacy_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_legacy())
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn scheme_counts(&self) -> SchemeCounts {
        let mut counts = SchemeCounts::default();
        for entry in self.entries.values() {
            match entry.scheme() {
                Scheme::Sodium => counts.sodium += 1,
                Scheme::Crypto => counts.crypto += 1,
                Scheme::Legacy => counts.legacy += 1,
                Scheme::Plain => counts.plain += 1,
            }
        }
        counts
    }
}

/// A decrypted secret held in memory.
///
/// The plaintext is zeroed on drop. Debug and Display both emit `[REDACTED]`
/// to prevent accidental logging.
#[derive(Clone, PartialEq, Eq)]
pub struct DecryptedSecret {
    inner: Zeroizing<String>,
}

impl DecryptedSecret {
    /// Create a new decrypted secret from raw plaintext.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: Zeroizing::new(value.into()),
        }
    }

    /// Expose the plaintext value. Use sparingly.
    pub fn expose(&self) -> &str {
        &self.inner
    }
}

impl fmt::Debug for DecryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for DecryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Outcome of [`crate::SecretStore::get_secret`].
///
/// Routine absence and failure are values, not errors, so callers can tell
/// "never stored" apart from "stored but unreadable right now".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretLookup {
    Found(DecryptedSecret),
    NotFound,
    /// The entry exists but failed authentication or could not be decoded.
    DecryptFailed { reason: String },
    /// The entry exists but the backend able to open it is not loaded.
    BackendUnavailable { scheme: Scheme },
}

impl SecretLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, SecretLookup::Found(_))
    }

    /// True for every variant except `NotFound`.
    pub fn exists(&self) -> bool {
        !matches!(self, SecretLookup::NotFound)
    }

    /// Collapse to the plaintext, discarding the failure reason.
    pub fn into_option(self) -> Option<DecryptedSecret> {
        match self {
            SecretLookup::Found(secret) => Some(secret),
            _ => None,
        }
    }
}

/// A legacy entry that could not be migrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationFailure {
    pub key: String,
    pub reason: String,
}

/// Result of [`crate::SecretStore::migrate_to_sodium`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub migrated: Vec<String>,
    pub failed: Vec<MigrationFailure>,
    /// Whether the document was written after at least one migration.
    pub persisted: bool,
}

impl MigrationReport {
    pub fn is_empty(&self) -> bool {
        self.migrated.is_empty() && self.failed.is_empty()
    }
}

/// Number of entries per scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchemeCounts {
    pub sodium: usize,
    pub crypto: usize,
    pub legacy: usize,
    pub plain: usize,
}

/// Snapshot of an initialized store's capabilities and contents.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub path: PathBuf,
    pub sodium_available: bool,
    pub safe_storage_available: bool,
    /// Method used for new writes.
    pub write_method: Method,
    pub entries: SchemeCounts,
}
