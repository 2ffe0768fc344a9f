//! Platform safe storage: the facility legacy entries were written with.
//!
//! Before per-entry method tags existed, values were handed to the host's
//! safe storage and the opaque bytes it returned were stored as-is. That
//! facility is only reachable when its wrapping key is: in the OS keychain
//! (macOS) or in an environment variable set by the host application. A bare
//! command-line run usually has neither, and then no facility exists.
//!
//! Sealed layout: `salt(32) || nonce(12) || AES-256-GCM ciphertext+tag`, with
//! the cipher key derived per value from the wrapping key via HKDF-SHA256.

use std::sync::Arc;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use hkdf::Hkdf;
use hostvault_core::config::LegacyConfig;
use rand::RngCore;
use sha2::Sha256;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::error::{Result, SecretError};
use crate::keychain;

const NONCE_SIZE: usize = 12;
const SALT_SIZE: usize = 32;
const KEY_SIZE: usize = 32;

/// HKDF info string used to domain-separate derived keys.
const HKDF_INFO: &[u8] = b"hostvault-safe-storage-v1";

/// String encryption provided by the host platform.
pub trait SafeStorage: Send + Sync {
    fn encrypt_string(&self, plaintext: &str) -> Result<Vec<u8>>;
    fn decrypt_string(&self, sealed: &[u8]) -> Result<String>;
}

/// Safe storage backed by a wrapping key held in the keychain or environment.
pub struct KeychainSafeStorage {
    wrapping_key: Zeroizing<[u8; KEY_SIZE]>,
}

impl KeychainSafeStorage {
    pub fn from_key(key: [u8; KEY_SIZE]) -> Self {
        Self {
            wrapping_key: Zeroizing::new(key),
        }
    }

    /// Look for the facility on this host. `None` when it is disabled, when no
    /// wrapping key is provisioned, or when the keychain cannot be read.
    pub fn detect(config: &LegacyConfig) -> Option<Arc<dyn SafeStorage>> {
        if !config.enabled {
            debug!("legacy safe storage disabled by configuration");
            return None;
        }

        match keychain::find_wrapping_key(
            &config.key_env,
            &config.keychain_service,
            &config.keychain_account,
        ) {
            Ok(Some(key)) => {
                debug!("platform safe storage available");
                Some(Arc::new(Self::from_key(*key)))
            }
            Ok(None) => {
                debug!("no platform safe storage on this host");
                None
            }
            Err(e) => {
                warn!("platform safe storage unavailable: {e}");
                None
            }
        }
    }

    /// Derive the per-value cipher key from the wrapping key and `salt`.
    fn derive_key(&self, salt: &[u8]) -> Zeroizing<[u8; KEY_SIZE]> {
        let hk = Hkdf::<Sha256>::new(Some(salt), self.wrapping_key.as_slice());
        let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
        // expand cannot fail when output length <= 255 * hash-length
        hk.expand(HKDF_INFO, okm.as_mut_slice())
            .expect("HKDF expand should not fail for 32-byte output");
        okm
    }
}

impl SafeStorage for KeychainSafeStorage {
    fn encrypt_string(&self, plaintext: &str) -> Result<Vec<u8>> {
        let mut salt = [0u8; SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut salt);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let key = self.derive_key(&salt);
        let cipher = Aes256Gcm::new_from_slice(key.as_slice())
            .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;

        let mut sealed = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&salt);
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn decrypt_string(&self, sealed: &[u8]) -> Result<String> {
        if sealed.len() < SALT_SIZE + NONCE_SIZE {
            return Err(SecretError::SafeStorage(
                "sealed value too short".to_string(),
            ));
        }

        let (salt, rest) = sealed.split_at(SALT_SIZE);
        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_SIZE);

        let key = self.derive_key(salt);
        let cipher = Aes256Gcm::new_from_slice(key.as_slice())
            .map_err(|e| SecretError::DecryptionFailed(e.to_string()))?;

        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| SecretError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| SecretError::DecryptionFailed(format!("invalid UTF-8: {e}")))
    }
}
