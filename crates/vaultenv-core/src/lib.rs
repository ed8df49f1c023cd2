//! # vaultenv-core
//!
//! Core library for vaultenv providing:
//! - Deployment configuration loading (serverless.yml)
//! - Typed views over the `custom.vault` and `custom.kms` sections
//! - Secret path to request URL mapping

pub mod config;
pub mod error;
pub mod types;

pub use config::DeployConfig;
pub use error::{Error, Result};
pub use types::{
    normalize_base_url, EncryptionKeyRef, EnvironmentDeclaration, KmsSection, KmsSettings,
    SecretPath, SecretPaths, VaultSection, VaultSettings, DEFAULT_KMS_REGION,
    DEFAULT_KMS_TIMEOUT_SECS, DEFAULT_VAULT_TIMEOUT_SECS,
};
