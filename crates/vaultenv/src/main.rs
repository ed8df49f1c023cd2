//! vaultenv - inject secret store values into deployment environments
//!
//! This is the main entry point for the vaultenv command-line interface.

mod cli;
mod commands;
mod output;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);
    output::set_quiet(cli.quiet);

    let result = match cli.command {
        Commands::Package(args) => commands::package::run(args, cli.config.as_deref()).await,
        Commands::OfflineStart(args) => {
            commands::offline_start::run(args, cli.config.as_deref()).await
        }
        Commands::Paths(args) => commands::paths::run(args, cli.config.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing with appropriate verbosity.
///
/// Logs go to stderr; stdout carries the rewritten config or JSON output.
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
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
