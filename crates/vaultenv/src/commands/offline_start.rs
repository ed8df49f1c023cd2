//! `vaultenv offline-start`: the before-offline-start phase
//!
//! The resolved variables are handed to the child command only; the
//! environment of this process is never modified.

use anyhow::{Context, Result};
use camino::Utf8Path;
use clap::Args;
use std::process::ExitCode;
use tokio::process::Command;
use tracing::debug;
use vaultenv_core::DeployConfig;
use vaultenv_secrets::{DeployHooks, VaultEnvPlugin};

use super::{report, with_spinner};
use crate::cli::PhaseArgs;

#[derive(Args, Debug)]
pub struct OfflineStartArgs {
    #[command(flatten)]
    pub phase: PhaseArgs,

    /// Print the phase summary as JSON (keys and statuses, never values)
    #[arg(long)]
    pub json: bool,

    /// Command to launch with the resolved environment
    #[arg(last = true)]
    pub command: Vec<String>,
}

pub async fn run(args: OfflineStartArgs, config_path: Option<&Utf8Path>) -> Result<ExitCode> {
    let mut config = DeployConfig::load(config_path)?;
    let plugin = VaultEnvPlugin::new(args.phase.plugin_options());

    let outcome = with_spinner(
        "Loading environment from secret store...",
        plugin.before_offline_start(&mut config),
    )
    .await
    .context("Failed to load environment variables")?;

    report(&outcome, args.json)?;

    let Some((program, rest)) = args.command.split_first() else {
        return Ok(ExitCode::SUCCESS);
    };

    let mut command = Command::new(program);
    command.args(rest);
    outcome.environment.apply_to_command(&mut command);

    debug!(
        "Launching {} with {} injected variable(s)",
        program,
        outcome.environment.len()
    );
    let status = command
        .status()
        .await
        .with_context(|| format!("Failed to launch {}", program))?;

    Ok(exit_code(status.code()))
}

/// Map a child exit status onto ours; signal deaths report as 1
fn exit_code(code: Option<i32>) -> ExitCode {
    match code {
        Some(0) => ExitCode::SUCCESS,
        Some(c) => ExitCode::from(u8::try_from(c).unwrap_or(1)),
        None => ExitCode::FAILURE,
    }
}
