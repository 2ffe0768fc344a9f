//! AES-256-GCM fallback backend (`method: "crypto"`).
//!
//! Used for new writes whenever libsodium is not loaded. The blob layout is
//! `base64_standard(iv || tag || ciphertext)` with a 16-byte IV and a 16-byte
//! tag, so the tag sits in front of the ciphertext rather than after it as
//! the `aead` API returns it.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::Aead;
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, KeyInit, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;

use super::{SecretDecryptor, SecretEncryptor};
use crate::error::{Result, SecretError};
use crate::machine::MachineKey;
use crate::types::Method;

pub const IV_LEN: usize = 16;
pub const TAG_LEN: usize = 16;

type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// AES-256-GCM keyed with the machine key.
pub struct GcmBackend {
    cipher: Aes256Gcm16,
}

impl GcmBackend {
    pub fn new(key: &MachineKey) -> Self {
        Self {
            cipher: Aes256Gcm16::new(key.as_bytes().into()),
        }
    }
}

impl SecretDecryptor for GcmBackend {
    fn decrypt(&self, data: &str) -> Result<Vec<u8>> {
        let blob = STANDARD
            .decode(data)
            .map_err(|e| SecretError::DecryptionFailed(format!("base64 decode failed: {e}")))?;
        if blob.len() < IV_LEN + TAG_LEN {
            return Err(SecretError::DecryptionFailed(
                "ciphertext too short".to_string(),
            ));
        }

        let (iv, rest) = blob.split_at(IV_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);

        // aead expects ciphertext || tag.
        let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);

        self.cipher
            .decrypt(Nonce::<U16>::from_slice(iv), sealed.as_slice())
            .map_err(|_| SecretError::DecryptionFailed("authentication tag mismatch".to_string()))
    }
}

impl SecretEncryptor for GcmBackend {
    fn method(&self) -> Method {
        Method::Crypto
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);

        let sealed = self
            .cipher
            .encrypt(Nonce::<U16>::from_slice(&iv), plaintext)
            .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        let mut blob = Vec::with_capacity(IV_LEN + sealed.len());
        blob.extend_from_slice(&iv);
        blob.extend_from_slice(tag);
        blob.extend_from_slice(ciphertext);

        Ok(STANDARD.encode(blob))
    }
}
