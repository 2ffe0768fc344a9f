//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main hostvault configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Secret document settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Legacy platform safe storage settings.
    #[serde(default)]
    pub legacy: LegacyConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Secret document settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the secret document. Defaults to `~/.hostvault/secure-settings.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Load the libsodium backend at startup. When false, new secrets are
    /// written with the AES-GCM fallback and sodium entries stay unreadable.
    #[serde(default = "default_true")]
    pub prefer_sodium: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            prefer_sodium: true,
        }
    }
}

/// Where the retired platform safe storage keeps its wrapping key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyConfig {
    /// Look for the safe storage facility at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Keychain service name.
    #[serde(default = "default_keychain_service")]
    pub keychain_service: String,

    /// Keychain account name.
    #[serde(default = "default_keychain_account")]
    pub keychain_account: String,

    /// Environment variable holding the hex-encoded key on hosts without a keychain.
    #[serde(default = "default_key_env")]
    pub key_env: String,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keychain_service: default_keychain_service(),
            keychain_account: default_keychain_account(),
            key_env: default_key_env(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// The level as a `tracing` filter directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_keychain_service() -> String {
    "hostvault Safe Storage".to_string()
}

fn default_keychain_account() -> String {
    "hostvault".to_string()
}

fn default_key_env() -> String {
    crate::env::vars::HOSTVAULT_SAFE_STORAGE_KEY.to_string()
}
