//! In-process fakes for the network backends

use anyhow::{anyhow, Result as AnyResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use vaultenv_core::{EncryptionKeyRef, KmsSettings, VaultSettings};
use vaultenv_secrets::{Backends, KeyManagement, SecretFetcher, VaultKvSource};

/// KMS that returns a fixed blob and records every call
pub struct FakeKms {
    blob: Vec<u8>,
    fail_on: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeKms {
    pub fn returning(blob: &[u8]) -> Self {
        Self {
            blob: blob.to_vec(),
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail any call whose plaintext equals `plaintext`
    pub fn failing_on(mut self, plaintext: &str) -> Self {
        self.fail_on = Some(plaintext.to_string());
        self
    }

    /// (key id, plaintext) for every call so far
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyManagement for FakeKms {
    async fn encrypt(&self, key: &EncryptionKeyRef, plaintext: &[u8]) -> AnyResult<Vec<u8>> {
        let text = String::from_utf8_lossy(plaintext).to_string();
        self.calls
            .lock()
            .unwrap()
            .push((key.as_str().to_string(), text.clone()));
        if self.fail_on.as_deref() == Some(text.as_str()) {
            return Err(anyhow!("AccessDeniedException: not allowed"));
        }
        Ok(self.blob.clone())
    }
}

/// Real HTTP secret source, fake KMS
pub struct TestBackends {
    pub kms: Arc<FakeKms>,
    pub kms_settings: Mutex<Option<KmsSettings>>,
}

impl TestBackends {
    pub fn new(kms: FakeKms) -> Arc<Self> {
        Arc::new(Self {
            kms: Arc::new(kms),
            kms_settings: Mutex::new(None),
        })
    }
}

#[async_trait]
impl Backends for TestBackends {
    fn secret_fetcher(
        &self,
        settings: &VaultSettings,
    ) -> vaultenv_secrets::Result<Arc<dyn SecretFetcher>> {
        Ok(Arc::new(VaultKvSource::new(settings)?))
    }

    async fn key_management(
        &self,
        settings: &KmsSettings,
    ) -> vaultenv_secrets::Result<Arc<dyn KeyManagement>> {
        *self.kms_settings.lock().unwrap() = Some(settings.clone());
        Ok(self.kms.clone())
    }
}
