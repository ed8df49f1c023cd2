//! Deploy lifecycle phases exposed to the host tool
//!
//! The host calls `before_package` and `before_offline_start` explicitly
//! instead of registering into a dynamic hook table. Both phases run the
//! same pipeline; the outcome is handed back as an explicit context object
//! for later packaging steps.

use crate::encryptor::SelectiveEncryptor;
use crate::error::Result;
use crate::kms::{AwsKms, KeyManagement};
use crate::merger::{EnvironmentMerger, DEFAULT_APPLY_DEADLINE};
use crate::resolver::PathResolver;
use crate::sources::{SecretFetcher, VaultKvSource};
use crate::types::{Diagnostic, ResolvedEnvironment};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use vaultenv_core::{DeployConfig, KmsSettings, VaultSettings};

/// Lifecycle phase the pipeline runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Package,
    OfflineStart,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Package => write!(f, "before:package"),
            Phase::OfflineStart => write!(f, "before:offline-start"),
        }
    }
}

/// What one phase did to the deployment config
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
    pub phase: Phase,
    pub environment: ResolvedEnvironment,
    pub diagnostics: Vec<Diagnostic>,
    pub encrypted: bool,
    /// True when loading was disabled and the config was left alone
    pub skipped: bool,
}

impl PhaseOutcome {
    fn skipped(phase: Phase) -> Self {
        Self {
            phase,
            environment: ResolvedEnvironment::default(),
            diagnostics: Vec::new(),
            encrypted: false,
            skipped: true,
        }
    }
}

/// Two-phase interface the host deployment tool drives
#[async_trait]
pub trait DeployHooks: Send + Sync {
    async fn before_package(&self, config: &mut DeployConfig) -> Result<PhaseOutcome>;

    async fn before_offline_start(&self, config: &mut DeployConfig) -> Result<PhaseOutcome>;
}

/// Builds the network backends for one run
#[async_trait]
pub trait Backends: Send + Sync {
    fn secret_fetcher(&self, settings: &VaultSettings) -> Result<Arc<dyn SecretFetcher>>;

    async fn key_management(&self, settings: &KmsSettings) -> Result<Arc<dyn KeyManagement>>;
}

/// Vault over HTTP and AWS KMS
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBackends;

#[async_trait]
impl Backends for DefaultBackends {
    fn secret_fetcher(&self, settings: &VaultSettings) -> Result<Arc<dyn SecretFetcher>> {
        Ok(Arc::new(VaultKvSource::new(settings)?))
    }

    async fn key_management(&self, settings: &KmsSettings) -> Result<Arc<dyn KeyManagement>> {
        Ok(Arc::new(AwsKms::new(settings).await))
    }
}

/// Options the host passes through from its command line
#[derive(Debug, Clone)]
pub struct PluginOptions {
    /// Opt-in switch; when false both phases are no-ops
    pub enabled: bool,
    /// KMS region used when `custom.kms.region` is unset
    pub region: Option<String>,
    pub deadline: Duration,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            region: None,
            deadline: DEFAULT_APPLY_DEADLINE,
        }
    }
}

pub struct VaultEnvPlugin {
    options: PluginOptions,
    backends: Arc<dyn Backends>,
}

impl VaultEnvPlugin {
    pub fn new(options: PluginOptions) -> Self {
        Self::with_backends(options, Arc::new(DefaultBackends))
    }

    pub fn with_backends(options: PluginOptions, backends: Arc<dyn Backends>) -> Self {
        if !options.enabled {
            info!("VAULT: loading disabled, pass --vault to load variables from the secret store");
        }
        Self { options, backends }
    }

    async fn build_merger(&self, config: &DeployConfig) -> Result<EnvironmentMerger> {
        let vault = config.vault_settings()?;
        let resolver = PathResolver::from_settings(self.backends.secret_fetcher(&vault)?, &vault);

        let encryptor = match config.kms_settings(self.options.region.as_deref())? {
            Some(kms) => {
                let client = self.backends.key_management(&kms).await?;
                SelectiveEncryptor::with_key(kms.key, client)
            }
            None => SelectiveEncryptor::disabled(),
        };

        Ok(EnvironmentMerger::new(resolver, encryptor).with_deadline(self.options.deadline))
    }

    async fn run_phase(&self, phase: Phase, config: &mut DeployConfig) -> Result<PhaseOutcome> {
        if !self.options.enabled {
            return Ok(PhaseOutcome::skipped(phase));
        }

        info!("VAULT: {} loading environment variables", phase);
        let result = async {
            let merger = self.build_merger(config).await?;
            merger.apply_to(config).await
        }
        .await;

        match result {
            Ok(outcome) => {
                info!("VAULT: {} done", phase);
                Ok(PhaseOutcome {
                    phase,
                    environment: outcome.environment,
                    diagnostics: outcome.diagnostics,
                    encrypted: outcome.encrypted,
                    skipped: false,
                })
            }
            Err(e) => {
                error!("VAULT: {} failed: {}", phase, e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl DeployHooks for VaultEnvPlugin {
    async fn before_package(&self, config: &mut DeployConfig) -> Result<PhaseOutcome> {
        self.run_phase(Phase::Package, config).await
    }

    async fn before_offline_start(&self, config: &mut DeployConfig) -> Result<PhaseOutcome> {
        self.run_phase(Phase::OfflineStart, config).await
    }
}
