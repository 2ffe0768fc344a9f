//! Secret store lifecycle through the public API.
//!
//! Each test opens stores over a scratch document, the way a process would
//! across restarts, and checks what ends up on disk.

use base64::{engine::general_purpose::STANDARD, Engine};
use hostvault_integration_tests::{legacy_entry, plain_entry, safe_storage, Workspace};
use hostvault_secrets::{
    Method, Scheme, SecretDocument, SecretError, SecretLookup, SecretStore, StoreCapabilities,
};

fn expose(lookup: SecretLookup) -> String {
    match lookup {
        SecretLookup::Found(secret) => secret.expose().to_string(),
        other => panic!("expected a value, got {other:?}"),
    }
}

#[tokio::test]
async fn test_uninitialized_store_refuses_work() {
    let store = SecretStore::new();
    assert!(matches!(
        store.get_keys().await,
        Err(SecretError::NotInitialized)
    ));
}

#[tokio::test]
async fn test_token_lifecycle_across_restarts() {
    let ws = Workspace::new();

    let store = ws.open(StoreCapabilities::none()).await;
    assert!(store.set_secret("token", "abc123").await.unwrap());
    assert!(store.set_secret("refresh", "r-456").await.unwrap());
    drop(store);

    let store = ws.open(StoreCapabilities::none()).await;
    assert_eq!(store.get_keys().await.unwrap(), vec!["refresh", "token"]);
    assert_eq!(expose(store.get_secret("token").await.unwrap()), "abc123");

    assert!(store.delete_secret("token").await.unwrap());
    drop(store);

    let store = ws.open(StoreCapabilities::none()).await;
    assert_eq!(store.get_secret("token").await.unwrap(), SecretLookup::NotFound);
    assert!(store.clear().await.unwrap());
    drop(store);

    let store = ws.open(StoreCapabilities::none()).await;
    assert!(store.get_keys().await.unwrap().is_empty());
    assert_eq!(ws.read_raw().await, serde_json::json!({}));
}

#[tokio::test]
async fn test_persisted_entries_never_hold_plaintext() {
    let ws = Workspace::new();
    let store = ws.open(StoreCapabilities::none()).await;
    let secret = "correct horse battery staple";
    store.set_secret("phrase", secret).await.unwrap();

    let raw = ws.read_raw().await;
    let entry = &raw["phrase"];
    assert_eq!(entry["encrypted"], true);
    assert_eq!(entry["method"], "crypto");

    let data = entry["data"].as_str().unwrap();
    assert!(!data.contains(secret));
    assert_ne!(data, STANDARD.encode(secret));
    let text = tokio::fs::read_to_string(ws.document_path()).await.unwrap();
    assert!(!text.contains(secret));
}

#[tokio::test]
async fn test_tampered_document_is_rejected() {
    let ws = Workspace::new();
    let store = ws.open(StoreCapabilities::none()).await;
    store.set_secret("token", "abc123").await.unwrap();

    let mut raw = ws.read_raw().await;
    let blob = STANDARD.decode(raw["token"]["data"].as_str().unwrap()).unwrap();
    let mut forged = blob;
    forged[0] ^= 0xff;
    raw["token"]["data"] = serde_json::Value::String(STANDARD.encode(forged));
    ws.write_raw(&raw.to_string()).await;

    let store = ws.open(StoreCapabilities::none()).await;
    assert!(matches!(
        store.get_secret("token").await.unwrap(),
        SecretLookup::DecryptFailed { .. }
    ));
}

#[tokio::test]
async fn test_missing_document_starts_empty() {
    let ws = Workspace::new();
    let store = ws.open(StoreCapabilities::none()).await;
    assert!(store.get_keys().await.unwrap().is_empty());
    assert!(!ws.document_path().exists());
    assert_eq!(store.settings_path().await.unwrap(), ws.document_path());
}

#[tokio::test]
async fn test_malformed_document_starts_empty_and_is_replaced() {
    let ws = Workspace::new();
    ws.write_raw("{\"token\": {\"encrypted\": tru").await;

    let store = ws.open(StoreCapabilities::none()).await;
    assert!(store.get_keys().await.unwrap().is_empty());

    assert!(store.set_secret("token", "fresh").await.unwrap());
    let raw = ws.read_raw().await;
    assert_eq!(raw.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_method_starts_empty() {
    let ws = Workspace::new();
    ws.write_raw(r#"{"token": {"encrypted": true, "method": "rot13", "data": "abc"}}"#)
        .await;
    let store = ws.open(StoreCapabilities::none()).await;
    assert!(store.get_keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scheme_classification() {
    let ws = Workspace::new();
    let storage = safe_storage();
    let mut document = SecretDocument::new();
    document.insert("legacy", legacy_entry(storage.as_ref(), "old-token"));
    document.insert("plain", plain_entry("visible"));
    ws.write_document(&document).await;

    // Without the facility the legacy entry is listed but unusable.
    let store = ws.open(StoreCapabilities::none()).await;
    assert_eq!(store.get_keys().await.unwrap(), vec!["legacy", "plain"]);
    assert!(!store.has_secret("legacy").await.unwrap());
    assert_eq!(
        store.get_secret("legacy").await.unwrap(),
        SecretLookup::BackendUnavailable {
            scheme: Scheme::Legacy
        }
    );
    assert_eq!(expose(store.get_secret("plain").await.unwrap()), "visible");

    // With it, the same document reads fine.
    let store = ws
        .open(StoreCapabilities::none().with_safe_storage(storage))
        .await;
    assert!(store.has_secret("legacy").await.unwrap());
    assert_eq!(expose(store.get_secret("legacy").await.unwrap()), "old-token");

    let status = store.status().await.unwrap();
    assert_eq!(status.entries.legacy, 1);
    assert_eq!(status.entries.plain, 1);
}

#[tokio::test]
async fn test_fallback_when_sodium_is_disabled() {
    let ws = Workspace::new();
    let store = ws.open(StoreCapabilities::none().without_sodium()).await;

    assert!(store.set_secret("token", "abc123").await.unwrap());
    assert_eq!(ws.read_raw().await["token"]["method"], "crypto");
    assert_eq!(store.status().await.unwrap().write_method, Method::Crypto);
    assert_eq!(expose(store.get_secret("token").await.unwrap()), "abc123");
}

#[tokio::test]
async fn test_migration_without_sodium_keeps_document() {
    let ws = Workspace::new();
    let storage = safe_storage();
    let mut document = SecretDocument::new();
    document.insert("a", legacy_entry(storage.as_ref(), "alpha"));
    ws.write_document(&document).await;
    let before = tokio::fs::read_to_string(ws.document_path()).await.unwrap();

    let store = ws
        .open(StoreCapabilities::none().with_safe_storage(storage))
        .await;
    let report = store.migrate_to_sodium().await.unwrap();
    assert!(report.migrated.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(
        tokio::fs::read_to_string(ws.document_path()).await.unwrap(),
        before
    );
    // Still readable through the facility.
    assert_eq!(expose(store.get_secret("a").await.unwrap()), "alpha");
}

#[cfg(feature = "sodium")]
mod sodium {
    use super::*;
    use hostvault_secrets::{KeychainSafeStorage, SecretEntry};

    fn full() -> StoreCapabilities {
        StoreCapabilities::none()
            .with_sodium()
            .with_safe_storage(safe_storage())
    }

    #[tokio::test]
    async fn test_sodium_is_preferred() {
        let ws = Workspace::new();
        let store = ws.open(full()).await;
        store.set_secret("token", "abc123").await.unwrap();

        let raw = ws.read_raw().await;
        assert_eq!(raw["token"]["method"], "sodium");
        let data = raw["token"]["data"].as_str().unwrap();
        assert!(!data.contains('+') && !data.contains('/') && !data.contains('='));
    }

    #[tokio::test]
    async fn test_standard_alphabet_sodium_entry_decodes() {
        let ws = Workspace::new();
        let store = ws.open(full()).await;
        store.set_secret("token", "abc123").await.unwrap();

        // Rewrite the blob with the padded standard alphabet.
        let mut raw = ws.read_raw().await;
        let data = raw["token"]["data"].as_str().unwrap().to_string();
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(data)
            .unwrap();
        raw["token"]["data"] = serde_json::Value::String(STANDARD.encode(bytes));
        ws.write_raw(&raw.to_string()).await;

        let store = ws.open(full()).await;
        assert_eq!(expose(store.get_secret("token").await.unwrap()), "abc123");
    }

    #[tokio::test]
    async fn test_migrates_m_of_n() {
        let ws = Workspace::new();
        let storage = safe_storage();
        let stranger = KeychainSafeStorage::from_key([0x11; 32]);

        let mut document = SecretDocument::new();
        document.insert("one", legacy_entry(storage.as_ref(), "1"));
        document.insert("two", legacy_entry(storage.as_ref(), "2"));
        document.insert("three", legacy_entry(storage.as_ref(), "3"));
        document.insert("foreign", legacy_entry(&stranger, "unreachable"));
        document.insert(
            "garbled",
            SecretEntry {
                encrypted: true,
                method: None,
                data: "%%% not base64 %%%".to_string(),
            },
        );
        ws.write_document(&document).await;

        let store = ws.open(full()).await;
        let report = store.migrate_to_sodium().await.unwrap();
        assert_eq!(report.migrated.len(), 3);
        assert_eq!(report.failed.len(), 2);
        assert!(report.persisted);

        // A second pass only sees the two that failed.
        let again = store.migrate_to_sodium().await.unwrap();
        assert!(again.migrated.is_empty());
        assert_eq!(again.failed.len(), 2);

        let raw = ws.read_raw().await;
        for key in ["one", "two", "three"] {
            assert_eq!(raw[key]["method"], "sodium");
        }
        assert_eq!(raw["garbled"]["data"], "%%% not base64 %%%");

        // Migrated values no longer need the facility.
        let store = ws.open(StoreCapabilities::none().with_sodium()).await;
        assert_eq!(expose(store.get_secret("two").await.unwrap()), "2");
    }

    #[tokio::test]
    async fn test_sodium_entries_survive_a_degraded_run() {
        let ws = Workspace::new();
        ws.open(full())
            .await
            .set_secret("token", "abc123")
            .await
            .unwrap();

        let degraded = ws.open(StoreCapabilities::none()).await;
        assert_eq!(
            degraded.get_secret("token").await.unwrap(),
            SecretLookup::BackendUnavailable {
                scheme: Scheme::Sodium
            }
        );
        assert_eq!(degraded.get_keys().await.unwrap(), vec!["token"]);

        let restored = ws.open(full()).await;
        assert_eq!(expose(restored.get_secret("token").await.unwrap()), "abc123");
    }
}
