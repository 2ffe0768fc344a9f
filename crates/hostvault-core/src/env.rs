//! Environment variable handling.

use std::env;

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
pub fn get_var_or(name: &str, default: &str) -> String {
    get_var(name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable as a boolean.
pub fn get_bool(name: &str) -> bool {
    get_var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Environment variable names read by hostvault.
pub mod vars {
    /// Base directory override (defaults to `~/.hostvault`).
    pub const HOSTVAULT_HOME: &str = "HOSTVAULT_HOME";

    /// Config file override.
    pub const HOSTVAULT_CONFIG: &str = "HOSTVAULT_CONFIG";

    /// Secret document path override.
    pub const HOSTVAULT_STORE: &str = "HOSTVAULT_STORE";

    /// Log filter directive, takes precedence over `RUST_LOG`.
    pub const HOSTVAULT_LOG: &str = "HOSTVAULT_LOG";

    /// Disables the libsodium backend when truthy.
    pub const HOSTVAULT_NO_SODIUM: &str = "HOSTVAULT_NO_SODIUM";

    /// Hex-encoded safe storage key for hosts without a keychain.
    pub const HOSTVAULT_SAFE_STORAGE_KEY: &str = "HOSTVAULT_SAFE_STORAGE_KEY";
}
