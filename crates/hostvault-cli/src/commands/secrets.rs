//! Secret store commands.
//!
//! Each command prints its result on stdout and reports failure through the
//! exit code, so `hostvault has token && ...` works in scripts.

use std::process::ExitCode;

use console::{style, Term};
use hostvault_core::Config;
use hostvault_secrets::{SecretLookup, SecretsContext};
use tracing::debug;

/// Initialize the store described by `config`.
pub async fn open(config: Config) -> anyhow::Result<SecretsContext> {
    debug!(store = ?config.store, "opening secret store");
    SecretsContext::initialize(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize secret store: {e}"))
}

pub async fn set(ctx: &SecretsContext, key: &str, value: Option<String>) -> anyhow::Result<ExitCode> {
    let value = match value {
        Some(v) => v,
        None => rpassword::prompt_password(format!("Enter value for '{key}': "))
            .map_err(|e| anyhow::anyhow!("Failed to read secret: {e}"))?,
    };

    if value.is_empty() {
        anyhow::bail!("Secret value must not be empty");
    }

    if ctx.store().set_secret(key, &value).await? {
        println!("Secret '{key}' stored.");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Failed to store secret '{key}' (see log output).");
        Ok(ExitCode::FAILURE)
    }
}

pub async fn get(ctx: &SecretsContext, key: &str) -> anyhow::Result<ExitCode> {
    match ctx.store().get_secret(key).await? {
        SecretLookup::Found(secret) => {
            println!("{}", secret.expose());
            Ok(ExitCode::SUCCESS)
        }
        SecretLookup::NotFound => {
            eprintln!("Secret '{key}' not found.");
            Ok(ExitCode::FAILURE)
        }
        SecretLookup::DecryptFailed { reason } => {
            eprintln!("Secret '{key}' could not be decrypted: {reason}");
            Ok(ExitCode::FAILURE)
        }
        SecretLookup::BackendUnavailable { scheme } => {
            eprintln!("Secret '{key}' uses the {scheme} scheme, which is unavailable on this host.");
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn has(ctx: &SecretsContext, key: &str) -> anyhow::Result<ExitCode> {
    let present = ctx.store().has_secret(key).await?;
    println!("{present}");
    Ok(if present {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub async fn delete(ctx: &SecretsContext, key: &str) -> anyhow::Result<ExitCode> {
    if ctx.store().delete_secret(key).await? {
        println!("Secret '{key}' deleted.");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Secret '{key}' not found.");
        Ok(ExitCode::FAILURE)
    }
}

pub async fn clear(ctx: &SecretsContext, yes: bool) -> anyhow::Result<ExitCode> {
    let count = ctx.store().get_keys().await?.len();
    if !yes && !confirm(&format!("Delete all {count} secret(s)? [y/N] "))? {
        eprintln!("Aborted.");
        return Ok(ExitCode::FAILURE);
    }

    if ctx.store().clear().await? {
        println!("Removed {count} secret(s).");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Failed to write the cleared secret document (see log output).");
        Ok(ExitCode::FAILURE)
    }
}

pub async fn keys(ctx: &SecretsContext) -> anyhow::Result<ExitCode> {
    for key in ctx.store().get_keys().await? {
        println!("{key}");
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn migrate(ctx: &SecretsContext) -> anyhow::Result<ExitCode> {
    let report = ctx.store().migrate_to_sodium().await?;

    if report.is_empty() {
        println!("No legacy secrets to migrate.");
        return Ok(ExitCode::SUCCESS);
    }

    for key in &report.migrated {
        println!("  {} {key}", style("migrated").green());
    }
    for failure in &report.failed {
        println!("  {} {}: {}", style("failed").red(), failure.key, failure.reason);
    }
    println!(
        "\n{} migrated, {} failed.",
        report.migrated.len(),
        report.failed.len()
    );

    if !report.migrated.is_empty() && !report.persisted {
        eprintln!("Migrated entries could not be written to disk.");
        return Ok(ExitCode::FAILURE);
    }
    Ok(if report.failed.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

pub async fn path(ctx: &SecretsContext) -> anyhow::Result<ExitCode> {
    println!("{}", ctx.store().settings_path().await?.display());
    Ok(ExitCode::SUCCESS)
}

/// Ask a yes/no question on the terminal. Anything but `y`/`yes` is a no,
/// including a non-interactive stdin.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    let term = Term::stderr();
    if !term.is_term() {
        return Ok(false);
    }
    term.write_str(prompt)?;
    let answer = term.read_line()?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
