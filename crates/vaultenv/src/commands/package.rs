//! `vaultenv package`: the before-package phase

use anyhow::{bail, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use std::process::ExitCode;
use vaultenv_core::DeployConfig;
use vaultenv_secrets::{DeployHooks, VaultEnvPlugin};

use super::{report, with_spinner};
use crate::cli::PhaseArgs;
use crate::output;

#[derive(Args, Debug)]
pub struct PackageArgs {
    #[command(flatten)]
    pub phase: PhaseArgs,

    /// Write the updated config to this file instead of stdout
    #[arg(short, long, conflicts_with = "in_place")]
    pub output: Option<Utf8PathBuf>,

    /// Write the updated config back to the file it was loaded from
    #[arg(long)]
    pub in_place: bool,

    /// Print the phase summary as JSON (keys and statuses, never values)
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: PackageArgs, config_path: Option<&Utf8Path>) -> Result<ExitCode> {
    if args.json && args.output.is_none() && !args.in_place {
        bail!("--json writes the summary to stdout; use --output or --in-place for the config");
    }

    let mut config = DeployConfig::load(config_path)?;
    let plugin = VaultEnvPlugin::new(args.phase.plugin_options());

    let outcome = with_spinner(
        "Loading environment from secret store...",
        plugin.before_package(&mut config),
    )
    .await
    .context("Failed to load environment variables")?;

    report(&outcome, args.json)?;

    if let Some(path) = &args.output {
        config.save_to(path)?;
        output::success(&format!("Wrote {}", path));
    } else if args.in_place {
        config.save()?;
        if let Some(path) = config.config_path() {
            output::success(&format!("Updated {}", path));
        }
    } else {
        print!("{}", config.to_yaml()?);
    }

    Ok(ExitCode::SUCCESS)
}
