//! hostvault command-line interface.

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use hostvault_core::config::LogLevel;
use hostvault_core::env::{self, vars};
use hostvault_core::Config;
use tracing_subscriber::EnvFilter;

/// hostvault - machine-bound encrypted secret store
#[derive(Parser)]
#[command(name = "hostvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "HOSTVAULT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Store a secret (prompts for the value unless --value is given)
    Set {
        /// Secret key
        key: String,

        /// Secret value
        #[arg(long)]
        value: Option<String>,
    },

    /// Print a decrypted secret
    Get {
        /// Secret key
        key: String,
    },

    /// Check whether a secret exists and can be decrypted here
    Has {
        /// Secret key
        key: String,
    },

    /// Delete a secret
    Delete {
        /// Secret key
        key: String,
    },

    /// Delete every secret
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List stored keys
    Keys,

    /// Re-encrypt legacy entries with libsodium
    Migrate,

    /// Print the secret document path
    Path,

    /// Run diagnostics
    Doctor(commands::doctor::DoctorArgs),

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Show version information
    Version,
}

/// Build the log filter.
///
/// `HOSTVAULT_LOG` wins over `RUST_LOG`; without either, `-v` flags raise the
/// level above the configured one.
pub fn log_filter(verbose: u8, configured: Option<LogLevel>) -> EnvFilter {
    if let Some(directive) = env::get_var(vars::HOSTVAULT_LOG) {
        if let Ok(filter) = EnvFilter::try_new(directive) {
            return filter;
        }
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let level = match verbose {
        0 => configured.unwrap_or_default().as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::new(format!("hostvault={level}"))
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_path = cli.config.as_deref();

    let command = match cli.command {
        Commands::Version => {
            println!("hostvault {}", env!("CARGO_PKG_VERSION"));
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Config(args) => return commands::config::run(args, config_path),
        command => command,
    };

    let config = Config::load_or_default(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;
    if let Commands::Doctor(args) = command {
        return commands::doctor::run(args, config).await;
    }

    let ctx = commands::secrets::open(config).await?;
    match command {
        Commands::Set { key, value } => commands::secrets::set(&ctx, &key, value).await,
        Commands::Get { key } => commands::secrets::get(&ctx, &key).await,
        Commands::Has { key } => commands::secrets::has(&ctx, &key).await,
        Commands::Delete { key } => commands::secrets::delete(&ctx, &key).await,
        Commands::Clear { yes } => commands::secrets::clear(&ctx, yes).await,
        Commands::Keys => commands::secrets::keys(&ctx).await,
        Commands::Migrate => commands::secrets::migrate(&ctx).await,
        Commands::Path => commands::secrets::path(&ctx).await,
        Commands::Version | Commands::Config(_) | Commands::Doctor(_) => {
            unreachable!("handled before the store is opened")
        }
    }
}
