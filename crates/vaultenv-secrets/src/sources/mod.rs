//! Secret fetcher trait and implementations

pub mod vault;

use crate::error::Result;
use crate::types::SecretMap;
use async_trait::async_trait;
use url::Url;
use vaultenv_core::SecretPath;

/// Reads one secret path from a secret store
#[async_trait]
pub trait SecretFetcher: Send + Sync {
    /// Perform one authenticated read of `url` and return its key/value pairs.
    ///
    /// `path` is the logical location, used for error messages.
    async fn fetch(&self, path: &SecretPath, url: &Url) -> Result<SecretMap>;

    /// Source name for log messages
    fn name(&self) -> &'static str;
}

pub use vault::{fetch, VaultKvSource};
