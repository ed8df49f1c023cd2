//! Error types for the secret pipeline

use std::time::Duration;
use thiserror::Error;

/// Result type alias using vaultenv-secrets' Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors. Every variant fails the deploy; nothing is retried.
#[derive(Error, Debug)]
pub enum Error {
    /// Network, auth, or parse failure reaching the secret store
    #[error("failed to fetch secrets from '{path}': {cause}")]
    SecretFetch { path: String, cause: String },

    /// KMS encrypt call failed for one key; the whole batch is discarded
    #[error("failed to encrypt '{key}' with KMS: {cause}")]
    Encryption { key: String, cause: String },

    /// Missing or invalid configuration
    #[error(transparent)]
    Configuration(#[from] vaultenv_core::Error),

    /// The overall deadline for one apply run elapsed
    #[error("secret resolution did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}

impl Error {
    pub fn secret_fetch(path: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::SecretFetch {
            path: path.into(),
            cause: cause.to_string(),
        }
    }

    pub fn encryption(key: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::Encryption {
            key: key.into(),
            cause: cause.to_string(),
        }
    }
}
