//! libsodium secretbox backend (`method: "sodium"`).
//!
//! Blobs are `nonce(24) || secretbox(plaintext)`, written with the URL-safe
//! unpadded base64 alphabet. Older writers of the same format used the
//! standard padded alphabet, so decoding falls back to it.
//!
//! The library is optional: it is compiled in with the `sodium` feature and
//! still has to initialize at runtime. [`SodiumLibrary::load`] is the only way
//! to obtain the token a [`SodiumBackend`] is built from.

#[cfg(feature = "sodium")]
mod imp {
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
    use base64::Engine;
    use sodiumoxide::crypto::secretbox;
    use tracing::{debug, warn};

    use crate::backend::{SecretDecryptor, SecretEncryptor};
    use crate::error::{Result, SecretError};
    use crate::machine::MachineKey;
    use crate::types::Method;

    pub const NONCE_LEN: usize = secretbox::NONCEBYTES;

    /// Decode with the URL-safe alphabet, retrying with the standard one.
    fn decode_either(data: &str) -> Result<Vec<u8>> {
        URL_SAFE_NO_PAD
            .decode(data)
            .or_else(|_| STANDARD.decode(data))
            .map_err(|e| SecretError::DecryptionFailed(format!("base64 decode failed: {e}")))
    }

    /// Proof that libsodium initialized in this process.
    #[derive(Debug, Clone, Copy)]
    pub struct SodiumLibrary {
        _private: (),
    }

    impl SodiumLibrary {
        pub fn load() -> Option<Self> {
            match sodiumoxide::init() {
                Ok(()) => {
                    debug!("libsodium initialized");
                    Some(Self { _private: () })
                }
                Err(()) => {
                    warn!("libsodium failed to initialize; falling back to AES-GCM");
                    None
                }
            }
        }
    }

    /// XSalsa20-Poly1305 keyed with the machine key.
    pub struct SodiumBackend {
        key: secretbox::Key,
    }

    impl SodiumBackend {
        pub fn new(_library: SodiumLibrary, key: &MachineKey) -> Self {
            Self {
                key: secretbox::Key(*key.as_bytes()),
            }
        }
    }

    impl SecretDecryptor for SodiumBackend {
        fn decrypt(&self, data: &str) -> Result<Vec<u8>> {
            let blob = decode_either(data)?;
            if blob.len() < NONCE_LEN + secretbox::MACBYTES {
                return Err(SecretError::DecryptionFailed(
                    "ciphertext too short".to_string(),
                ));
            }

            let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
            let nonce = secretbox::Nonce::from_slice(nonce)
                .ok_or_else(|| SecretError::DecryptionFailed("invalid nonce".to_string()))?;

            secretbox::open(ciphertext, &nonce, &self.key).map_err(|()| {
                SecretError::DecryptionFailed("secretbox authentication failed".to_string())
            })
        }
    }

    impl SecretEncryptor for SodiumBackend {
        fn method(&self) -> Method {
            Method::Sodium
        }

        fn encrypt(&self, plaintext: &[u8]) -> Result<String> {
            let nonce = secretbox::gen_nonce();
            let ciphertext = secretbox::seal(plaintext, &nonce, &self.key);

            let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
            blob.extend_from_slice(&nonce.0);
            blob.extend_from_slice(&ciphertext);

            Ok(URL_SAFE_NO_PAD.encode(blob))
        }
    }
}

#[cfg(not(feature = "sodium"))]
mod imp {
    use tracing::debug;

    use crate::backend::{SecretDecryptor, SecretEncryptor};
    use crate::error::Result;
    use crate::machine::MachineKey;
    use crate::types::Method;

    /// Never constructed: the crate was built without libsodium.
    #[derive(Debug, Clone, Copy)]
    pub enum SodiumLibrary {}

    impl SodiumLibrary {
        pub fn load() -> Option<Self> {
            debug!("built without the `sodium` feature");
            None
        }
    }

    pub enum SodiumBackend {}

    impl SodiumBackend {
        pub fn new(library: SodiumLibrary, _key: &MachineKey) -> Self {
            match library {}
        }
    }

    impl SecretDecryptor for SodiumBackend {
        fn decrypt(&self, _data: &str) -> Result<Vec<u8>> {
            match *self {}
        }
    }

    impl SecretEncryptor for SodiumBackend {
        fn method(&self) -> Method {
            match *self {}
        }

        fn encrypt(&self, _plaintext: &[u8]) -> Result<String> {
            match *self {}
        }
    }
}

pub use imp::{SodiumBackend, SodiumLibrary};
