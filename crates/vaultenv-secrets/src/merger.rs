//! Environment merging: resolve, select, encrypt, commit

use crate::encryptor::SelectiveEncryptor;
use crate::error::{Error, Result};
use crate::resolver::PathResolver;
use crate::types::{Diagnostic, KeyStatus, ResolvedEnvironment, SecretMap};
use std::time::Duration;
use tracing::{info, warn};
use vaultenv_core::{DeployConfig, EnvironmentDeclaration};

/// Upper bound for one complete resolve + encrypt run
pub const DEFAULT_APPLY_DEADLINE: Duration = Duration::from_secs(120);

/// Result of one successful merge
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub environment: ResolvedEnvironment,
    pub diagnostics: Vec<Diagnostic>,
    pub encrypted: bool,
}

impl MergeOutcome {
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.diagnostics
            .iter()
            .filter(|d| d.status == KeyStatus::NotFound)
            .map(|d| d.key.as_str())
    }
}

/// Stage the declared keys that exist in `secrets`.
///
/// Every declared key gets exactly one diagnostic, in declaration order.
pub fn select(
    declaration: &EnvironmentDeclaration,
    secrets: &SecretMap,
) -> (SecretMap, Vec<Diagnostic>) {
    let mut staged = SecretMap::new();
    let mut diagnostics = Vec::with_capacity(declaration.len());

    for key in declaration.iter() {
        match secrets.get(key) {
            Some(value) => {
                staged.insert(key, value.clone());
                diagnostics.push(Diagnostic::found(key));
            }
            None => diagnostics.push(Diagnostic::not_found(key)),
        }
    }

    (staged, diagnostics)
}

/// Order staged values by declaration; keys never declared are not carried over
fn in_declaration_order(
    declaration: &EnvironmentDeclaration,
    staged: &SecretMap,
) -> ResolvedEnvironment {
    ResolvedEnvironment::from_ordered(
        declaration
            .iter()
            .filter_map(|key| staged.get(key).map(|v| (key.to_string(), v.clone())))
            .collect(),
    )
}

/// Overwrite `provider.environment` with the resolved set.
///
/// Declared keys that were not resolved are dropped.
pub fn commit(config: &mut DeployConfig, environment: &ResolvedEnvironment) -> Result<()> {
    config.replace_environment(environment.to_pairs())?;
    Ok(())
}

/// Orchestrates the path resolver and the selective encryptor
pub struct EnvironmentMerger {
    resolver: PathResolver,
    encryptor: SelectiveEncryptor,
    deadline: Duration,
}

impl EnvironmentMerger {
    pub fn new(resolver: PathResolver, encryptor: SelectiveEncryptor) -> Self {
        Self {
            resolver,
            encryptor,
            deadline: DEFAULT_APPLY_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Resolve, select and encrypt. Does not touch any configuration.
    pub async fn apply(&self, declaration: &EnvironmentDeclaration) -> Result<MergeOutcome> {
        tokio::time::timeout(self.deadline, self.run(declaration))
            .await
            .map_err(|_| Error::DeadlineExceeded(self.deadline))?
    }

    async fn run(&self, declaration: &EnvironmentDeclaration) -> Result<MergeOutcome> {
        let secrets = self.resolver.resolve_all().await?;
        let (staged, diagnostics) = select(declaration, &secrets);

        for diagnostic in diagnostics
            .iter()
            .filter(|d| d.status == KeyStatus::NotFound)
        {
            warn!("{}", diagnostic);
        }
        info!(
            "Resolved {} of {} declared environment variables",
            staged.len(),
            declaration.len()
        );

        let staged = self.encryptor.encrypt_all(staged).await?;

        Ok(MergeOutcome {
            environment: in_declaration_order(declaration, &staged),
            diagnostics,
            encrypted: self.encryptor.is_enabled(),
        })
    }

    /// Full pipeline including the commit into `config`.
    ///
    /// `config` is only modified when every step succeeded.
    pub async fn apply_to(&self, config: &mut DeployConfig) -> Result<MergeOutcome> {
        let declaration = config.environment_declaration()?;
        let outcome = self.apply(&declaration).await?;
        commit(config, &outcome.environment)?;
        Ok(outcome)
    }
}
