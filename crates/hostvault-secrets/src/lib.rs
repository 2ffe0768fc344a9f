//! Machine-bound encrypted secret storage for hostvault.
//!
//! Secrets live in one JSON document keyed by name. Each entry records how it
//! was sealed: libsodium secretbox when available, AES-256-GCM otherwise, both
//! keyed by a digest of host attributes so the file is useless on another
//! machine. Entries from before method tags existed are opened through the
//! platform safe storage and can be migrated to libsodium in place.

pub mod backend;
pub mod context;
pub mod error;
pub mod keychain;
pub mod machine;
pub mod persist;
pub mod safe_storage;
pub mod store;
pub mod types;

pub use context::SecretsContext;
pub use error::{Result, SecretError};
pub use machine::{MachineAttributes, MachineKey};
pub use safe_storage::{KeychainSafeStorage, SafeStorage};
pub use store::{SecretStore, StoreCapabilities};
pub use types::{
    DecryptedSecret, Method, MigrationFailure, MigrationReport, Scheme, SchemeCounts,
    SecretDocument, SecretEntry, SecretLookup, StoreStatus,
};
