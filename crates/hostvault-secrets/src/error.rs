//! Error types for secret management.

use thiserror::Error;

/// Errors that can occur during secret operations.
///
/// Only [`SecretError::NotInitialized`] and [`SecretError::Validation`] ever
/// escape the public [`crate::SecretStore`] operations; [`SecretError::Config`]
/// comes from [`crate::SecretsContext::initialize`]. The rest are produced
/// by backends and persistence and get folded into lookup results or boolean
/// outcomes by the store.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Secret store not initialized")]
    NotInitialized,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Safe storage error: {0}")]
    SafeStorage(String),

    #[error("Keychain error: {0}")]
    KeychainError(String),

    #[error("Configuration error: {0}")]
    Config(#[from] hostvault_core::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result alias for secret operations.
pub type Result<T> = std::result::Result<T, SecretError>;
