//! Read-only backends for entries without a method tag.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};

use super::SecretDecryptor;
use crate::error::{Result, SecretError};
use crate::safe_storage::SafeStorage;

/// Opens `encrypted: true` entries written by the platform safe storage.
///
/// `data` is `base64_standard(safe_storage.encrypt_string(plaintext))`.
/// Only available when a [`SafeStorage`] facility was found at startup.
#[derive(Clone)]
pub struct LegacyBackend {
    storage: Arc<dyn SafeStorage>,
}

impl LegacyBackend {
    pub fn new(storage: Arc<dyn SafeStorage>) -> Self {
        Self { storage }
    }
}

impl SecretDecryptor for LegacyBackend {
    fn decrypt(&self, data: &str) -> Result<Vec<u8>> {
        let sealed = STANDARD
            .decode(data)
            .map_err(|e| SecretError::DecryptionFailed(format!("base64 decode failed: {e}")))?;
        let plaintext = self.storage.decrypt_string(&sealed)?;
        Ok(plaintext.into_bytes())
    }
}

/// Opens entries with no `encrypted` flag: plain base64 of the value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainBackend;

impl SecretDecryptor for PlainBackend {
    fn decrypt(&self, data: &str) -> Result<Vec<u8>> {
        STANDARD
            .decode(data)
            .map_err(|e| SecretError::DecryptionFailed(format!("base64 decode failed: {e}")))
    }
}
