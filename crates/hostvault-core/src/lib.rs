//! # hostvault-core
//!
//! Shared plumbing for the hostvault crates:
//!
//! - **Configuration**: loading, validation, and persistence of `hostvault.json5`
//! - **Paths**: resolution of the base directory and the secret document
//! - **Environment**: typed access to `HOSTVAULT_*` variables

pub mod config;
pub mod env;
pub mod error;
pub mod paths;

// Re-exports for convenience
pub use config::Config;
pub use error::{ConfigError, Error, Result};
