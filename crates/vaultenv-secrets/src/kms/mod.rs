//! Key management seam used by the selective encryptor

pub mod aws;

use anyhow::Result;
use async_trait::async_trait;
use vaultenv_core::EncryptionKeyRef;

/// A cloud key-management service that can encrypt small plaintexts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyManagement: Send + Sync {
    /// Encrypt `plaintext` under `key`, returning the raw ciphertext blob
    async fn encrypt(&self, key: &EncryptionKeyRef, plaintext: &[u8]) -> Result<Vec<u8>>;
}

pub use aws::AwsKms;
