//! Diagnostic commands.

use std::process::ExitCode;

use clap::Args;
use console::{style, Emoji};
use hostvault_core::config::Config;
use hostvault_core::env::{self, vars};
use hostvault_secrets::{MachineAttributes, SecretsContext, StoreStatus};

static CHECK: Emoji = Emoji("✓", "+");
static CROSS: Emoji = Emoji("✗", "x");
static WARN: Emoji = Emoji("⚠", "!");

/// Doctor command arguments.
#[derive(Args)]
pub struct DoctorArgs {
    /// Print the store status as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the doctor command.
pub async fn run(args: DoctorArgs, config: Config) -> anyhow::Result<ExitCode> {
    let ctx = SecretsContext::initialize(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize secret store: {e}"))?;
    let status = ctx.store().status().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(ExitCode::SUCCESS);
    }

    let (errors, warnings) = report(ctx.config(), &status);

    println!("\n{}", style("Summary").bold());
    println!("  Errors: {}", if errors > 0 { style(errors).red() } else { style(errors).green() });
    println!("  Warnings: {}", if warnings > 0 { style(warnings).yellow() } else { style(warnings).green() });

    Ok(if errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Print every check. Returns `(errors, warnings)`.
fn report(config: &Config, status: &StoreStatus) -> (usize, usize) {
    let mut errors = 0;
    let mut warnings = 0;

    println!("hostvault Doctor\n");

    println!("Checking configuration...");
    match config.validate() {
        Ok(()) => println!("  {} Configuration valid", style(CHECK).green()),
        Err(e) => {
            println!("  {} Configuration invalid: {}", style(CROSS).red(), e);
            errors += 1;
        }
    }

    println!("\nChecking machine identity...");
    let attributes = MachineAttributes::collect();
    for (name, value) in [
        ("hostname", &attributes.hostname),
        ("home directory", &attributes.home_dir),
        ("user id", &attributes.user_id),
    ] {
        if value.is_some() {
            println!("  {} {name} resolved", style(CHECK).green());
        } else {
            println!(
                "  {} Could not determine {name}; key is less machine-specific",
                style(WARN).yellow()
            );
            warnings += 1;
        }
    }

    println!("\nChecking backends...");
    if status.sodium_available {
        println!("  {} libsodium available", style(CHECK).green());
    } else if config.store.prefer_sodium {
        println!("  {} libsodium unavailable, writing with {}", style(WARN).yellow(), status.write_method);
        warnings += 1;
    } else {
        println!("  {} libsodium disabled by configuration", style(WARN).yellow());
        if env::get_bool(vars::HOSTVAULT_NO_SODIUM) {
            println!("    ({} is set)", vars::HOSTVAULT_NO_SODIUM);
        }
        warnings += 1;
    }
    if status.safe_storage_available {
        println!("  {} Platform safe storage available", style(CHECK).green());
    } else {
        println!("  {} Platform safe storage unavailable", style(WARN).yellow());
    }

    println!("\nChecking secret document...");
    println!("  Path: {}", status.path.display());
    let counts = status.entries;
    println!(
        "  Entries: {} sodium, {} crypto, {} legacy, {} plain",
        counts.sodium, counts.crypto, counts.legacy, counts.plain
    );
    if counts.sodium > 0 && !status.sodium_available {
        println!("  {} {} sodium entries unreadable on this host", style(CROSS).red(), counts.sodium);
        errors += 1;
    }
    if counts.legacy > 0 {
        if status.safe_storage_available && status.sodium_available {
            println!("  {} {} legacy entries; run 'hostvault migrate'", style(WARN).yellow(), counts.legacy);
        } else {
            println!("  {} {} legacy entries cannot be migrated on this host", style(WARN).yellow(), counts.legacy);
        }
        warnings += 1;
    }
    if counts.plain > 0 {
        println!("  {} {} unencrypted entries", style(WARN).yellow(), counts.plain);
        warnings += 1;
    }

    (errors, warnings)
}
