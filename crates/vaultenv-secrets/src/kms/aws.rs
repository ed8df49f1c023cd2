//! AWS KMS backend

use crate::kms::KeyManagement;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_kms::config::Region;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::Client;
use std::time::Duration;
use tracing::debug;
use vaultenv_core::{EncryptionKeyRef, KmsSettings};

pub struct AwsKms {
    client: Client,
    timeout: Duration,
}

impl AwsKms {
    /// Create a KMS client for the configured region, optional endpoint and
    /// per-call timeout
    pub async fn new(settings: &KmsSettings) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_kms::config::Builder::from(&sdk_config);
        if let Some(endpoint) = settings.endpoint.as_deref() {
            debug!("Using custom KMS endpoint: {}", endpoint);
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
            timeout: settings.timeout,
        }
    }
}

#[async_trait]
impl KeyManagement for AwsKms {
    async fn encrypt(&self, key: &EncryptionKeyRef, plaintext: &[u8]) -> Result<Vec<u8>> {
        let request = self
            .client
            .encrypt()
            .key_id(key.as_str())
            .plaintext(Blob::new(plaintext.to_vec()))
            .send();

        let output = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| anyhow!("KMS encrypt timed out after {:?}", self.timeout))?
            .context("KMS encrypt request failed")?;

        output
            .ciphertext_blob()
            .map(|blob| blob.as_ref().to_vec())
            .ok_or_else(|| anyhow!("KMS encrypt returned no ciphertext"))
    }
}
