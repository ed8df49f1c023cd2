//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use vaultenv_secrets::{PluginOptions, DEFAULT_APPLY_DEADLINE};

pub use crate::commands::offline_start::OfflineStartArgs;
pub use crate::commands::package::PackageArgs;
pub use crate::commands::paths::PathsArgs;

/// vaultenv - load secret store values into a deployment's environment
#[derive(Parser, Debug)]
#[command(name = "vaultenv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to serverless.yml (searched upwards from the current directory by default)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the before-package phase and emit the updated config
    Package(PackageArgs),

    /// Run the before-offline-start phase, optionally launching a command
    OfflineStart(OfflineStartArgs),

    /// Show the request URL for each configured secret path
    Paths(PathsArgs),
}

/// Flags shared by both lifecycle phases
#[derive(Args, Debug, Clone)]
pub struct PhaseArgs {
    /// Load variables from the secret store (without it the phase does nothing)
    #[arg(long)]
    pub vault: bool,

    /// KMS region when custom.kms.region is not set
    #[arg(long)]
    pub region: Option<String>,

    /// Give up if resolution and encryption take longer than this
    #[arg(long, default_value_t = DEFAULT_APPLY_DEADLINE.as_secs())]
    pub deadline_secs: u64,
}

impl PhaseArgs {
    pub fn plugin_options(&self) -> PluginOptions {
        PluginOptions {
            enabled: self.vault,
            region: self.region.clone(),
            deadline: Duration::from_secs(self.deadline_secs),
        }
    }
}
