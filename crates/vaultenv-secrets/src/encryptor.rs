//! Selective encryption of secret values with KMS

use crate::error::{Error, Result};
use crate::kms::KeyManagement;
use crate::types::{SecretMap, SecretValue};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};
use vaultenv_core::EncryptionKeyRef;

/// Replace every value with its base64 KMS ciphertext.
///
/// Without a key this is the identity. With a key, all values are encrypted
/// concurrently and substituted only after every call succeeded; one failure
/// fails the batch. Empty values stay empty: KMS rejects zero-byte plaintext.
pub async fn encrypt_all(
    secrets: SecretMap,
    key: Option<&EncryptionKeyRef>,
    kms: &dyn KeyManagement,
) -> Result<SecretMap> {
    let Some(key) = key else {
        return Ok(secrets);
    };

    let calls = secrets
        .iter()
        .filter(|(name, value)| {
            if value.is_empty() {
                debug!("Leaving empty value of '{}' unencrypted", name);
            }
            !value.is_empty()
        })
        .map(|(name, value)| async move {
            let blob = kms
                .encrypt(key, value.expose().as_bytes())
                .await
                .map_err(|e| Error::encryption(name.as_str(), format!("{:#}", e)))?;
            debug!("Encrypted '{}' ({} byte ciphertext)", name, blob.len());
            Ok::<_, Error>((name.clone(), SecretValue::new(BASE64.encode(blob))))
        });
    let ciphertexts = try_join_all(calls).await?;

    let mut output = secrets;
    for (name, ciphertext) in ciphertexts {
        output.replace_existing(&name, ciphertext);
    }
    Ok(output)
}

/// Encryption step of the pipeline, switched on by the presence of a key
#[derive(Clone, Default)]
pub struct SelectiveEncryptor {
    target: Option<(EncryptionKeyRef, Arc<dyn KeyManagement>)>,
}

impl SelectiveEncryptor {
    /// Pass values through unchanged
    pub fn disabled() -> Self {
        Self { target: None }
    }

    pub fn with_key(key: EncryptionKeyRef, kms: Arc<dyn KeyManagement>) -> Self {
        Self {
            target: Some((key, kms)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    pub fn key(&self) -> Option<&EncryptionKeyRef> {
        self.target.as_ref().map(|(key, _)| key)
    }

    pub async fn encrypt_all(&self, secrets: SecretMap) -> Result<SecretMap> {
        match &self.target {
            Some((key, kms)) => {
                info!("Encrypting {} environment variables with KMS", secrets.len());
                let encrypted = encrypt_all(secrets, Some(key), kms.as_ref()).await?;
                info!("Encrypted {} environment variables", encrypted.len());
                Ok(encrypted)
            }
            None => {
                info!("KMS key not configured, skipping encryption");
                Ok(secrets)
            }
        }
    }
}
