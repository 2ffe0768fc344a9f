//! Whole-document persistence.
//!
//! The document is read once at initialization and rewritten in full after
//! every mutation. Writes go straight to the target file; there is no
//! temp-file rename, so a crash mid-write can leave a truncated file, which
//! the next load treats as empty.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::Result;
use crate::types::SecretDocument;

/// Load the document at `path`.
///
/// A missing, unreadable, or malformed file yields an empty document. Nothing
/// here is ever surfaced as an error.
pub async fn load_document(path: &Path) -> SecretDocument {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no secret document yet, starting empty");
            return SecretDocument::new();
        }
        Err(e) => {
            warn!(path = %path.display(), "could not read secret document, starting empty: {e}");
            return SecretDocument::new();
        }
    };

    match serde_json::from_str::<SecretDocument>(&data) {
        Ok(document) => {
            debug!(path = %path.display(), entries = document.len(), "loaded secret document");
            document
        }
        Err(e) => {
            warn!(path = %path.display(), "malformed secret document, starting empty: {e}");
            SecretDocument::new()
        }
    }
}

/// Write `document` to `path`, creating the parent directory if needed.
pub async fn save_document(path: &Path, document: &SecretDocument) -> Result<()> {
    ensure_parent_dir(path).await?;

    let json = serde_json::to_string_pretty(document)?;
    debug!(path = %path.display(), entries = document.len(), "writing secret document");
    write_private_file(path, json.as_bytes()).await
}

/// Create the parent directory with mode 0700 on Unix. Existing directories
/// are left as they are.
async fn ensure_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if tokio::fs::try_exists(parent).await? {
        return Ok(());
    }

    tokio::fs::create_dir_all(parent).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o700);
        tokio::fs::set_permissions(parent, perms).await?;
    }

    Ok(())
}

/// Write `data` to `path` with mode 0600 on Unix.
async fn write_private_file(path: &Path, data: &[u8]) -> Result<()> {
    tokio::fs::write(path, data).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(path, perms).await?;
    }

    Ok(())
}
