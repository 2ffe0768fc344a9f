//! hostvault CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use hostvault_cli::{log_filter, run, Cli};
use hostvault_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // The config file may name a log level; a broken file is reported by the
    // command itself.
    let configured = Config::load_or_default(cli.config.as_deref())
        .ok()
        .map(|config| config.logging.level);

    tracing_subscriber::registry()
        .with(log_filter(cli.verbose, configured))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", console::style("error:").red().bold());
            ExitCode::FAILURE
        }
    }
}
