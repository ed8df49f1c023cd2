//! `custom.vault` and `custom.kms` sections

use crate::error::{Error, Result};
use crate::types::{SecretPath, SecretPaths};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default per-request timeout for secret store reads
pub const DEFAULT_VAULT_TIMEOUT_SECS: u64 = 30;

/// KMS region used when neither the config nor the CLI names one
pub const DEFAULT_KMS_REGION: &str = "us-east-1";

/// Default per-call timeout for KMS encrypt requests
pub const DEFAULT_KMS_TIMEOUT_SECS: u64 = 15;

fn default_ssl_check() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_VAULT_TIMEOUT_SECS
}

fn default_kms_timeout_secs() -> u64 {
    DEFAULT_KMS_TIMEOUT_SECS
}

/// Raw `custom.vault` section as written in the deployment config
#[derive(Clone, Serialize, Deserialize)]
pub struct VaultSection {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub paths: Option<SecretPaths>,

    /// TLS certificate verification. Turning it off is an explicit opt-in.
    #[serde(default = "default_ssl_check")]
    pub ssl_check: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VaultSection {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            paths: None,
            ssl_check: default_ssl_check(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl VaultSection {
    /// Secret store address, falling back to `VAULT_ADDR`
    pub fn base_url(&self) -> Result<Url> {
        self.base_url_with(|name| std::env::var(name).ok())
    }

    /// Same as [`VaultSection::base_url`] with an injectable env lookup
    pub fn base_url_with<F>(&self, lookup: F) -> Result<Url>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = non_blank(self.url.clone())
            .or_else(|| non_blank(lookup("VAULT_ADDR")))
            .ok_or_else(|| Error::missing_field("custom.vault.url"))?;
        normalize_base_url(&url, self.ssl_check)
    }

    /// Configured paths in order
    pub fn secret_paths(&self) -> Result<Vec<SecretPath>> {
        self.paths
            .as_ref()
            .ok_or_else(|| Error::missing_field("custom.vault.paths"))?
            .to_paths()
    }
}

impl fmt::Debug for VaultSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultSection")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("paths", &self.paths)
            .field("ssl_check", &self.ssl_check)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Validated secret store settings, ready for the fetcher
#[derive(Clone)]
pub struct VaultSettings {
    pub base_url: Url,
    pub token: String,
    pub paths: Vec<SecretPath>,
    pub verify_tls: bool,
    pub timeout: Duration,
}

impl VaultSettings {
    /// Validate a raw section, falling back to `VAULT_ADDR` / `VAULT_TOKEN`
    pub fn from_section(section: &VaultSection) -> Result<Self> {
        Self::from_section_with(section, |name| std::env::var(name).ok())
    }

    /// Same as [`VaultSettings::from_section`] with an injectable env lookup
    pub fn from_section_with<F>(section: &VaultSection, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = section.base_url_with(&lookup)?;
        let token = non_blank(section.token.clone())
            .or_else(|| non_blank(lookup("VAULT_TOKEN")))
            .ok_or_else(|| Error::missing_field("custom.vault.token"))?;
        let paths = section.secret_paths()?;

        if section.timeout_secs == 0 {
            return Err(Error::invalid_config(
                "custom.vault.timeout_secs must be greater than zero",
            ));
        }

        Ok(Self {
            base_url,
            token,
            paths,
            verify_tls: section.ssl_check,
            timeout: Duration::from_secs(section.timeout_secs),
        })
    }
}

impl fmt::Debug for VaultSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultSettings")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[REDACTED]")
            .field("paths", &self.paths)
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Parse the secret store address.
///
/// An address without a scheme gets `https://` when TLS verification is on
/// and `http://` when it is off. A trailing `/` is dropped.
pub fn normalize_base_url(raw: &str, verify_tls: bool) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else if verify_tls {
        format!("https://{}", trimmed)
    } else {
        format!("http://{}", trimmed)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|e| Error::invalid_config(format!("invalid custom.vault.url '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::invalid_config(format!(
            "unsupported scheme '{}' in custom.vault.url",
            other
        ))),
    }
}

/// Identifier of the KMS key used to encrypt secret values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptionKeyRef(String);

impl EncryptionKeyRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EncryptionKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw `custom.kms` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KmsSection {
    #[serde(default, rename = "keyId")]
    pub key_id: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_kms_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for KmsSection {
    fn default() -> Self {
        Self {
            key_id: None,
            region: None,
            endpoint: None,
            timeout_secs: default_kms_timeout_secs(),
        }
    }
}

/// KMS settings; only present when a usable key id is configured
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmsSettings {
    pub key: EncryptionKeyRef,
    pub region: String,
    pub endpoint: Option<String>,
    /// Limit for each encrypt call
    pub timeout: Duration,
}

impl KmsSettings {
    /// Region precedence: `custom.kms.region`, then `fallback_region`, then us-east-1.
    /// Returns `None` when no key id is set; that is the switch that skips encryption.
    pub fn from_section(
        section: &KmsSection,
        fallback_region: Option<&str>,
    ) -> Result<Option<Self>> {
        let Some(key_id) = section
            .key_id
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
        else {
            return Ok(None);
        };

        if section.timeout_secs == 0 {
            return Err(Error::invalid_config(
                "custom.kms.timeout_secs must be greater than zero",
            ));
        }

        let region = section
            .region
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .or(fallback_region)
            .unwrap_or(DEFAULT_KMS_REGION)
            .to_string();

        Ok(Some(Self {
            key: EncryptionKeyRef::new(key_id),
            region,
            endpoint: section
                .endpoint
                .clone()
                .filter(|e| !e.trim().is_empty()),
            timeout: Duration::from_secs(section.timeout_secs),
        }))
    }
}
