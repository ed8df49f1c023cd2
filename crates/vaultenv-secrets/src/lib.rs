//! Secret injection for deployments
//!
//! This crate fetches key/value secrets from a Vault KV v2 store and injects
//! the declared ones into a deployment configuration:
//! - **Resolution**: concurrent reads of every configured path, merged in path order
//! - **Encryption**: optional per-value KMS encryption, all-or-nothing
//! - **Merging**: only declared keys are written; missing keys are reported and dropped
//! - **Lifecycle**: explicit `before_package` / `before_offline_start` phases

pub mod encryptor;
pub mod error;
pub mod hooks;
pub mod kms;
pub mod merger;
pub mod resolver;
pub mod sources;
pub mod types;

pub use encryptor::{encrypt_all, SelectiveEncryptor};
pub use error::{Error, Result};
pub use hooks::{
    Backends, DefaultBackends, DeployHooks, Phase, PhaseOutcome, PluginOptions, VaultEnvPlugin,
};
pub use kms::{AwsKms, KeyManagement};
pub use merger::{commit, select, EnvironmentMerger, MergeOutcome, DEFAULT_APPLY_DEADLINE};
pub use resolver::PathResolver;
pub use sources::{fetch, SecretFetcher, VaultKvSource};
pub use types::{Diagnostic, KeyStatus, ResolvedEnvironment, SecretMap, SecretValue};
