//! Encryption backends.
//!
//! Every scheme an entry can carry has a backend that can open it. Only the
//! current methods ([`SodiumBackend`], [`GcmBackend`]) can also seal new
//! values; [`LegacyBackend`] and [`PlainBackend`] are read-only.

mod gcm;
mod legacy;
mod sodium;

pub use gcm::GcmBackend;
pub use legacy::{LegacyBackend, PlainBackend};
pub use sodium::{SodiumBackend, SodiumLibrary};

use crate::error::Result;
use crate::types::Method;

/// Opens the `data` string of a stored entry.
pub trait SecretDecryptor: Send + Sync {
    fn decrypt(&self, data: &str) -> Result<Vec<u8>>;
}

/// A backend that can also produce new entries.
pub trait SecretEncryptor: SecretDecryptor {
    /// Method tag written next to the ciphertext.
    fn method(&self) -> Method;

    /// Encrypt `plaintext` into the base64 `data` string of an entry.
    fn encrypt(&self, plaintext: &[u8]) -> Result<String>;
}
