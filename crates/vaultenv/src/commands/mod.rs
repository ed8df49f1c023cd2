//! CLI command implementations

pub mod offline_start;
pub mod package;
pub mod paths;

use anyhow::{Context, Result};
use serde_json::json;
use std::future::Future;
use vaultenv_secrets::{KeyStatus, PhaseOutcome};

use crate::output;

/// Run a lifecycle phase behind a spinner
async fn with_spinner<F, T>(msg: &str, phase: F) -> T
where
    F: Future<Output = T>,
{
    let spinner = output::spinner(msg);
    let result = phase.await;
    spinner.finish_and_clear();
    result
}

/// Summary of a phase without any secret values
fn summary_json(outcome: &PhaseOutcome) -> serde_json::Value {
    json!({
        "phase": outcome.phase.to_string(),
        "skipped": outcome.skipped,
        "encrypted": outcome.encrypted,
        "keys": outcome
            .diagnostics
            .iter()
            .map(|d| json!({ "key": d.key, "status": d.status }))
            .collect::<Vec<_>>(),
    })
}

/// Report a phase outcome, either as JSON on stdout or as status lines on stderr
fn report(outcome: &PhaseOutcome, as_json: bool) -> Result<()> {
    if as_json {
        let rendered = serde_json::to_string_pretty(&summary_json(outcome))
            .context("Failed to render phase summary")?;
        println!("{}", rendered);
        return Ok(());
    }

    if outcome.skipped {
        output::info("Secret store loading disabled (pass --vault to enable)");
        return Ok(());
    }

    output::header(&format!("{}", outcome.phase));
    for diagnostic in &outcome.diagnostics {
        match diagnostic.status {
            KeyStatus::Found => output::kv(&diagnostic.key, "FOUND"),
            KeyStatus::NotFound => output::warning(&diagnostic.to_string()),
        }
    }
    let suffix = if outcome.encrypted { " (KMS encrypted)" } else { "" };
    output::success(&format!(
        "Loaded {} environment variable(s){}",
        outcome.environment.len(),
        suffix
    ));
    Ok(())
}
