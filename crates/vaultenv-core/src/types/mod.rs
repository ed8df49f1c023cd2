//! Type definitions for the deployment config sections vaultenv reads

mod environment;
mod secret_path;
mod settings;

pub use environment::EnvironmentDeclaration;
pub use secret_path::{SecretPath, SecretPaths};
pub use settings::{
    normalize_base_url, EncryptionKeyRef, KmsSection, KmsSettings, VaultSection, VaultSettings,
    DEFAULT_KMS_REGION, DEFAULT_KMS_TIMEOUT_SECS, DEFAULT_VAULT_TIMEOUT_SECS,
};
