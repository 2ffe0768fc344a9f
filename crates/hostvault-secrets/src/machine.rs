//! Machine-bound key derivation.
//!
//! The store never asks for a passphrase. Instead the key is a SHA-256 digest
//! of `hostname:home_dir:platform:arch:user_id`, recomputed on every start and
//! never written anywhere. Copying the secret document to another machine (or
//! another user account) therefore leaves it unreadable.

use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the derived key in bytes.
pub const MACHINE_KEY_LEN: usize = 32;

const UNKNOWN_HOST: &str = "unknown-host";
const UNKNOWN_HOME: &str = "unknown-home";
const UNKNOWN_USER: &str = "unknown-user";

/// Host attributes the key is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineAttributes {
    pub hostname: Option<String>,
    pub home_dir: Option<String>,
    pub platform: String,
    pub arch: String,
    pub user_id: Option<String>,
}

impl MachineAttributes {
    /// Read the attributes of the current host and user.
    pub fn collect() -> Self {
        Self {
            hostname: hostname::get()
                .ok()
                .map(|h| h.to_string_lossy().into_owned())
                .filter(|h| !h.is_empty()),
            home_dir: dirs::home_dir().map(|p| p.to_string_lossy().into_owned()),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            user_id: current_user_id(),
        }
    }

    /// The colon-joined tuple that gets hashed.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.hostname.as_deref().unwrap_or(UNKNOWN_HOST),
            self.home_dir.as_deref().unwrap_or(UNKNOWN_HOME),
            self.platform,
            self.arch,
            self.user_id.as_deref().unwrap_or(UNKNOWN_USER),
        )
    }
}

#[cfg(unix)]
fn current_user_id() -> Option<String> {
    // SAFETY: getuid has no preconditions and cannot fail.
    let uid = unsafe { libc::getuid() };
    Some(uid.to_string())
}

#[cfg(not(unix))]
fn current_user_id() -> Option<String> {
    None
}

/// 256-bit symmetric key bound to this machine. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MachineKey {
    bytes: [u8; MACHINE_KEY_LEN],
}

impl MachineKey {
    /// Derive the key for the current host.
    pub fn for_this_machine() -> Self {
        derive_key(&MachineAttributes::collect())
    }

    pub fn from_bytes(bytes: [u8; MACHINE_KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; MACHINE_KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for MachineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MachineKey([REDACTED])")
    }
}

/// Derive a key from `attributes`. Deterministic; never fails.
pub fn derive_key(attributes: &MachineAttributes) -> MachineKey {
    let digest = Sha256::digest(attributes.fingerprint().as_bytes());
    let mut bytes = [0u8; MACHINE_KEY_LEN];
    bytes.copy_from_slice(&digest);
    MachineKey { bytes }
}
