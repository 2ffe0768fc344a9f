//! Lookup of the safe storage wrapping key.
//!
//! The key is resolved in priority order:
//! 1. The configured environment variable (hex-encoded), normally set by the
//!    host application that owns the safe storage
//! 2. OS keychain (macOS Keychain via Security.framework)
//!
//! Nothing here ever creates a key: the facility is read-only from the
//! store's point of view, so a missing key simply means "not available".

use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{Result, SecretError};

const KEY_LEN: usize = 32;

/// Find the wrapping key. `Ok(None)` means no facility is provisioned.
pub fn find_wrapping_key(
    env_var: &str,
    service: &str,
    account: &str,
) -> Result<Option<Zeroizing<[u8; KEY_LEN]>>> {
    if let Ok(hex_key) = std::env::var(env_var) {
        debug!("using safe storage key from {env_var}");
        let bytes = Zeroizing::new(hex::decode(hex_key.trim()).map_err(|e| {
            SecretError::KeychainError(format!("invalid hex in {env_var}: {e}"))
        })?);
        return to_key(&bytes, env_var).map(Some);
    }

    let Some(bytes) = get_from_keychain(service, account)? else {
        return Ok(None);
    };
    debug!(service, "using safe storage key from OS keychain");
    to_key(&bytes, "keychain").map(Some)
}

fn to_key(bytes: &[u8], source: &str) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if bytes.len() != KEY_LEN {
        return Err(SecretError::KeychainError(format!(
            "{source} must decode to exactly {KEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    key.copy_from_slice(bytes);
    Ok(key)
}

// ---------------------------------------------------------------------------
// macOS keychain implementation
// ---------------------------------------------------------------------------

#[cfg(target_os = "macos")]
fn get_from_keychain(service: &str, account: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
    use security_framework::passwords::get_generic_password;

    match get_generic_password(service, account) {
        Ok(data) => {
            // The key is stored as a hex string in the keychain.
            let hex_str = String::from_utf8(data.to_vec()).map_err(|e| {
                SecretError::KeychainError(format!("keychain data is not valid UTF-8: {e}"))
            })?;
            let key = hex::decode(hex_str.trim()).map_err(|e| {
                SecretError::KeychainError(format!("keychain data is not valid hex: {e}"))
            })?;
            Ok(Some(Zeroizing::new(key)))
        }
        Err(e) => {
            // errSecItemNotFound is the expected "not provisioned" case.
            let msg = e.to_string();
            if msg.contains("not found") || msg.contains("-25300") {
                Ok(None)
            } else {
                Err(SecretError::KeychainError(format!(
                    "keychain read failed: {e}"
                )))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Other platforms -- env-var only
// ---------------------------------------------------------------------------

#[cfg(not(target_os = "macos"))]
fn get_from_keychain(service: &str, _account: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
    debug!(service, "no OS keychain integration on this platform");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_env_var() {
        let var = "HOSTVAULT_TEST_KEYCHAIN_ENV_OK";
        std::env::set_var(var, hex::encode([9u8; 32]));
        let key = find_wrapping_key(var, "svc", "acct").unwrap().unwrap();
        assert_eq!(*key, [9u8; 32]);
        std::env::remove_var(var);
    }

    #[test]
    fn test_invalid_hex_in_env_var() {
        let var = "HOSTVAULT_TEST_KEYCHAIN_ENV_HEX";
        std::env::set_var(var, "not-valid-hex!");
        assert!(find_wrapping_key(var, "svc", "acct").is_err());
        std::env::remove_var(var);
    }

    #[test]
    fn test_wrong_length_key_in_env_var() {
        let var = "HOSTVAULT_TEST_KEYCHAIN_ENV_LEN";
        // 16 bytes instead of 32.
        std::env::set_var(var, hex::encode([0u8; 16]));
        assert!(find_wrapping_key(var, "svc", "acct").is_err());
        std::env::remove_var(var);
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_missing_everywhere_is_none() {
        let found = find_wrapping_key(
            "HOSTVAULT_TEST_KEYCHAIN_ENV_UNSET",
            "hostvault-test Safe Storage",
            "hostvault-test",
        )
        .unwrap();
        assert!(found.is_none());
    }
}
