//! Shared fixtures for the hostvault integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use hostvault_secrets::{
    KeychainSafeStorage, SafeStorage, SecretDocument, SecretEntry, SecretStore, StoreCapabilities,
};
use tempfile::TempDir;

/// Wrapping key of the safe storage the legacy fixtures are sealed with.
pub const SAFE_STORAGE_KEY: [u8; 32] = [0x5a; 32];

/// A scratch directory holding one secret document.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn document_path(&self) -> PathBuf {
        self.dir.path().join("secure-settings.json")
    }

    /// Open a fresh store over the document with `capabilities`.
    pub async fn open(&self, capabilities: StoreCapabilities) -> SecretStore {
        let store = SecretStore::new();
        store
            .initialize_with(self.document_path(), capabilities)
            .await;
        store
    }

    pub async fn read_raw(&self) -> serde_json::Value {
        let data = tokio::fs::read_to_string(self.document_path())
            .await
            .expect("read secret document");
        serde_json::from_str(&data).expect("secret document is JSON")
    }

    pub async fn write_raw(&self, contents: &str) {
        tokio::fs::write(self.document_path(), contents)
            .await
            .expect("write secret document");
    }

    pub async fn write_document(&self, document: &SecretDocument) {
        let json = serde_json::to_string_pretty(document).expect("serialize document");
        self.write_raw(&json).await;
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// The safe storage legacy fixtures are written with.
pub fn safe_storage() -> Arc<dyn SafeStorage> {
    Arc::new(KeychainSafeStorage::from_key(SAFE_STORAGE_KEY))
}

/// A legacy entry the way the old write path produced it.
pub fn legacy_entry(storage: &dyn SafeStorage, plaintext: &str) -> SecretEntry {
    let sealed = storage.encrypt_string(plaintext).expect("seal legacy value");
    SecretEntry {
        encrypted: true,
        method: None,
        data: STANDARD.encode(sealed),
    }
}

/// An unencrypted entry: base64 of the value, no flags.
pub fn plain_entry(plaintext: &str) -> SecretEntry {
    SecretEntry {
        encrypted: false,
        method: None,
        data: STANDARD.encode(plaintext),
    }
}
