//! Process-wide secret store context.
//!
//! The CLI (or any embedding host) builds one [`SecretsContext`] at startup
//! and hands out clones. Every clone shares the same [`SecretStore`], so a
//! value written through one is visible through all of them.

use std::sync::Arc;

use hostvault_core::Config;
use tracing::debug;

use crate::error::Result;
use crate::store::{SecretStore, StoreCapabilities};

/// Shared handle to the configuration and the initialized store.
#[derive(Clone)]
pub struct SecretsContext {
    config: Arc<Config>,
    store: Arc<SecretStore>,
}

impl SecretsContext {
    /// Resolve the document path from `config`, probe the host, and
    /// initialize the store.
    pub async fn initialize(config: Config) -> Result<Self> {
        let capabilities = StoreCapabilities::from_config(&config);
        Self::initialize_with(config, capabilities).await
    }

    /// Like [`SecretsContext::initialize`] with explicit capabilities.
    pub async fn initialize_with(config: Config, capabilities: StoreCapabilities) -> Result<Self> {
        let path = config.store_path()?;
        debug!(path = %path.display(), ?capabilities, "initializing secrets context");

        let store = SecretStore::new();
        store.initialize_with(path, capabilities).await;

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
        })
    }

    pub fn store(&self) -> &SecretStore {
        &self.store
    }

    /// A shareable handle to the store.
    pub fn store_handle(&self) -> Arc<SecretStore> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
