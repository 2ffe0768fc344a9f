//! Path resolution utilities.

use crate::env::{self, vars};
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// File name of the secret document inside the base directory.
pub const SECRETS_FILE_NAME: &str = "secure-settings.json";

/// Get the hostvault base directory (`$HOSTVAULT_HOME` or `~/.hostvault`).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    if let Some(home) = env::get_var(vars::HOSTVAULT_HOME) {
        return Ok(expand_tilde(&home));
    }
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".hostvault"))
}

/// Get the main config file path (`~/.hostvault/hostvault.json5`).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    if let Some(path) = env::get_var(vars::HOSTVAULT_CONFIG) {
        return Ok(expand_tilde(&path));
    }
    Ok(base_dir()?.join("hostvault.json5"))
}

/// Get the default secret document path (`~/.hostvault/secure-settings.json`).
pub fn secrets_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join(SECRETS_FILE_NAME))
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Expand tilde in an already-parsed path.
pub fn expand_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => expand_tilde(s),
        None => path.to_path_buf(),
    }
}
