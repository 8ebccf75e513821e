//! Obscure CLI - encrypted personal backups across cloud providers
//!
//! This is the main entry point for the Obscure command-line interface.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Backup(args) => commands::backup::run(args, cli.config.as_deref()).await,
        Commands::Restore(args) => commands::restore::run(args, cli.config.as_deref()).await,
        Commands::Ls(args) => commands::ls::run(args, cli.config.as_deref()).await,
        Commands::Rm(args) => commands::rm::run(args, cli.config.as_deref()).await,
        Commands::Rmdir(args) => commands::rmdir::run(args, cli.config.as_deref()).await,
        Commands::SwitchProvider(args) => {
            commands::switch_provider::run(args, cli.config.as_deref())
        }
        Commands::Scheduler(args) => commands::scheduler::run(args, cli.config.as_deref()).await,
    };

    if let Err(err) = &result {
        if let Some(hint) = err
            .downcast_ref::<obscure_core::Error>()
            .and_then(|e| e.remediation())
        {
            output::warning(hint);
        }
    }

    result
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
