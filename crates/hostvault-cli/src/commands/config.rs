//! Configuration management commands.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Args;
use hostvault_core::config::Config;
use hostvault_core::paths;

/// Config command arguments.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(clap::Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Validate configuration
    Validate,
}

/// Run the config command.
pub fn run(args: ConfigArgs, config_path: Option<&Path>) -> anyhow::Result<ExitCode> {
    let path = resolve_path(config_path)?;

    match args.command {
        ConfigCommand::Show => {
            let config = Config::load_or_default(Some(&path))?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            init(&path, force)?;
            println!("Created config file: {}", path.display());
        }

        ConfigCommand::Validate => {
            let config = Config::load(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;
            if let Err(e) = config.validate() {
                eprintln!("{e}");
                return Ok(ExitCode::FAILURE);
            }
            println!("Configuration is valid");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn resolve_path(config_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(paths::config_file()?),
    }
}

/// Write the default configuration to `path`.
fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }
    Config::default().save(path)?;
    Ok(())
}
