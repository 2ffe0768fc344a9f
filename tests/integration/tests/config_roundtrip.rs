//! Config save/load roundtrip and context wiring.

use hostvault_core::config::{Config, ConfigBuilder, LogLevel};
use hostvault_secrets::{SecretsContext, StoreCapabilities};
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hostvault.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.store.prefer_sodium, config.store.prefer_sodium);
    assert_eq!(loaded.legacy.keychain_service, config.legacy.keychain_service);
    assert_eq!(loaded.logging.level, config.logging.level);
}

#[test]
fn test_json5_with_comments() {
    let config = Config::parse(
        r#"{
            // where the secrets live
            store: { path: "/srv/hv/secrets.json", prefer_sodium: false },
            logging: { level: "debug" },
        }"#,
    )
    .unwrap();
    assert_eq!(
        config.store.path.as_deref(),
        Some(std::path::Path::new("/srv/hv/secrets.json"))
    );
    assert!(!config.store.prefer_sodium);
    assert_eq!(config.logging.level, LogLevel::Debug);
}

#[test]
fn test_load_or_default_with_missing_file() {
    let dir = TempDir::new().unwrap();
    let config = Config::load_or_default(Some(&dir.path().join("absent.json5"))).unwrap();
    assert!(config.legacy.enabled);
}

#[test]
fn test_load_or_default_with_broken_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hostvault.json5");
    std::fs::write(&path, "{ store: ").unwrap();
    assert!(Config::load_or_default(Some(&path)).is_err());
}

#[tokio::test]
async fn test_context_follows_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("secrets.json");
    let config = ConfigBuilder::new().store_path(&path).build();

    let ctx = SecretsContext::initialize_with(config, StoreCapabilities::none())
        .await
        .unwrap();
    assert!(ctx.store().set_secret("token", "abc123").await.unwrap());
    assert!(path.exists());
    assert_eq!(ctx.store().settings_path().await.unwrap(), path);
}
