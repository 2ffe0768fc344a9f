//! Configuration loading and persistence.

use super::{Config, LogLevel};
use crate::env::{self, vars};
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer, so we use serde_json with pretty print
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if let Some(path) = &self.store.path {
            if path.as_os_str().is_empty() {
                errors.push("store.path must not be empty".to_string());
            } else if path.is_dir() {
                errors.push(format!(
                    "store.path points at a directory: {}",
                    path.display()
                ));
            }
        }

        if self.legacy.enabled {
            if self.legacy.keychain_service.trim().is_empty() {
                errors.push("legacy.keychain_service must not be empty".to_string());
            }
            if self.legacy.key_env.trim().is_empty() {
                errors.push("legacy.key_env must not be empty".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Load configuration from `path` (or the default path), falling back to
    /// defaults when no file exists, then apply environment overrides.
    ///
    /// A config file that exists but cannot be parsed is an error: silently
    /// ignoring it would point the store at the wrong document.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => paths::config_file()?,
        };

        let mut config = match Self::load(&path) {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => Self::default(),
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `HOSTVAULT_STORE` and `HOSTVAULT_NO_SODIUM`.
    pub fn apply_env_overrides(&mut self) {
        if let Some(store) = env::get_var(vars::HOSTVAULT_STORE) {
            self.store.path = Some(paths::expand_tilde(&store));
        }
        if env::get_bool(vars::HOSTVAULT_NO_SODIUM) {
            if self.store.prefer_sodium {
                warn!("{} is set; libsodium backend disabled", vars::HOSTVAULT_NO_SODIUM);
            }
            self.store.prefer_sodium = false;
        }
    }

    /// Resolved path of the secret document.
    pub fn store_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.store.path {
            Some(path) => Ok(paths::expand_path(path)),
            None => paths::secrets_file(),
        }
    }
}

/// Configuration builder for creating configs programmatically.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new config builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the secret document path.
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store.path = Some(path.into());
        self
    }

    /// Enable or disable the libsodium backend.
    pub fn prefer_sodium(mut self, enabled: bool) -> Self {
        self.config.store.prefer_sodium = enabled;
        self
    }

    /// Enable or disable legacy safe storage detection.
    pub fn legacy_enabled(mut self, enabled: bool) -> Self {
        self.config.legacy.enabled = enabled;
        self
    }

    /// Set the environment variable carrying the safe storage key.
    pub fn legacy_key_env(mut self, name: impl Into<String>) -> Self {
        self.config.legacy.key_env = name.into();
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build the config.
    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_json5_with_comments() {
        let config = Config::parse(
            r#"{
                // where secrets live
                store: { path: "/tmp/hv/secrets.json", prefer_sodium: false },
                logging: { level: "debug" },
            }"#,
        )
        .unwrap();

        assert_eq!(config.store.path, Some(PathBuf::from("/tmp/hv/secrets.json")));
        assert!(!config.store.prefer_sodium);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.legacy.enabled);
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse("{}").unwrap();
        assert!(config.store.prefer_sodium);
        assert!(config.store.path.is_none());
        assert_eq!(config.legacy.key_env, vars::HOSTVAULT_SAFE_STORAGE_KEY);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            Config::parse("store: ["),
            Err(ConfigError::Json5(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("hostvault.json5");

        let config = ConfigBuilder::new()
            .store_path("/var/lib/hv/secrets.json")
            .prefer_sodium(false)
            .log_level(LogLevel::Error)
            .build();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.store.path, config.store.path);
        assert!(!loaded.store.prefer_sodium);
        assert_eq!(loaded.logging.level, LogLevel::Error);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let result = Config::load(Path::new("/nonexistent/hostvault.json5"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_or_default(Some(&dir.path().join("absent.json5"))).unwrap();
        assert!(config.legacy.enabled);
    }

    #[test]
    fn test_load_or_default_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hostvault.json5");
        fs::write(&path, "{{{{").unwrap();
        assert!(Config::load_or_default(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_collects_errors() {
        let dir = TempDir::new().unwrap();
        let mut config = ConfigBuilder::new().store_path(dir.path()).build();
        config.legacy.keychain_service = " ".to_string();
        config.legacy.key_env = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("directory"));
        assert!(err.contains("keychain_service"));
        assert!(err.contains("key_env"));
    }

    #[test]
    fn test_validate_skips_legacy_when_disabled() {
        let mut config = ConfigBuilder::new().legacy_enabled(false).build();
        config.legacy.key_env = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_path_explicit() {
        let config = ConfigBuilder::new().store_path("/srv/secrets.json").build();
        assert_eq!(config.store_path().unwrap(), PathBuf::from("/srv/secrets.json"));
    }
}
