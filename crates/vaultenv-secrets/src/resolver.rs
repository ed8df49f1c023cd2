//! Path resolution: concurrent fetches merged in declared path order

use crate::error::Result;
use crate::sources::SecretFetcher;
use crate::types::SecretMap;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;
use vaultenv_core::{SecretPath, VaultSettings};

/// Fetches every configured path and merges the results.
///
/// Later paths overwrite earlier ones on key collision. Merge order is the
/// configured order, never completion order. Any failed fetch fails the
/// whole resolution and partial results are dropped.
pub struct PathResolver {
    fetcher: Arc<dyn SecretFetcher>,
    base_url: Url,
    paths: Vec<SecretPath>,
}

impl PathResolver {
    pub fn new(fetcher: Arc<dyn SecretFetcher>, base_url: Url, paths: Vec<SecretPath>) -> Self {
        Self {
            fetcher,
            base_url,
            paths,
        }
    }

    pub fn from_settings(fetcher: Arc<dyn SecretFetcher>, settings: &VaultSettings) -> Self {
        Self::new(fetcher, settings.base_url.clone(), settings.paths.clone())
    }

    /// Request URL for every configured path, in order
    pub fn request_urls(&self) -> Result<Vec<(SecretPath, Url)>> {
        self.paths
            .iter()
            .map(|p| -> Result<(SecretPath, Url)> {
                Ok((p.clone(), p.request_url(&self.base_url)?))
            })
            .collect()
    }

    pub async fn resolve_all(&self) -> Result<SecretMap> {
        let requests = self.request_urls()?;
        info!(
            "Loading secrets from {} ({} path{})",
            self.fetcher.name(),
            requests.len(),
            if requests.len() == 1 { "" } else { "s" }
        );

        // join_all keeps input order, so results line up with `requests`
        let results = join_all(
            requests
                .iter()
                .map(|(path, url)| self.fetcher.fetch(path, url)),
        )
        .await;

        let mut merged = SecretMap::new();
        for ((path, _), result) in requests.iter().zip(results) {
            let secrets = result?;
            debug!("Merging {} keys from '{}'", secrets.len(), path);
            merged.merge(secrets);
        }

        Ok(merged)
    }
}
