//! `vaultenv paths`: show where each configured path will be read from
//!
//! Works offline; the token is not required.

use anyhow::{Context, Result};
use camino::Utf8Path;
use clap::Args;
use serde_json::json;
use std::process::ExitCode;
use url::Url;
use vaultenv_core::{DeployConfig, SecretPath};

use crate::output;

#[derive(Args, Debug)]
pub struct PathsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Request URL for every configured path, in configuration order.
///
/// `lookup` resolves the `VAULT_ADDR` fallback.
fn request_urls<F>(config: &DeployConfig, lookup: F) -> Result<Vec<(SecretPath, Url)>>
where
    F: Fn(&str) -> Option<String>,
{
    let section = config.vault_section()?;
    let base = section.base_url_with(lookup)?;

    section
        .secret_paths()?
        .into_iter()
        .map(|path| -> Result<(SecretPath, Url)> {
            let url = path.request_url(&base)?;
            Ok((path, url))
        })
        .collect()
}

pub fn run(args: PathsArgs, config_path: Option<&Utf8Path>) -> Result<ExitCode> {
    let config = DeployConfig::load(config_path)?;
    let urls = request_urls(&config, |name| std::env::var(name).ok())?;

    if args.json {
        let rendered = serde_json::to_string_pretty(
            &urls
                .iter()
                .map(|(path, url)| json!({ "path": path.as_str(), "url": url.as_str() }))
                .collect::<Vec<_>>(),
        )
        .context("Failed to render paths")?;
        println!("{}", rendered);
    } else {
        output::header("Secret paths (later paths override earlier ones)");
        for (path, url) in &urls {
            println!("{}  {}", path, url);
        }
    }

    Ok(ExitCode::SUCCESS)
}
