//! Deployment configuration file loading and rewriting

use crate::error::{Error, Result};
use crate::types::{EnvironmentDeclaration, KmsSection, KmsSettings, VaultSection, VaultSettings};
use camino::{Utf8Path, Utf8PathBuf};
use serde_yaml_ng::{Mapping, Value};
use std::fs;
use tracing::debug;

/// Configuration file names to search for
pub const CONFIG_FILE_NAMES: &[&str] = &["serverless.yml", "serverless.yaml"];

/// The host tool's deployment configuration.
///
/// Kept as an untyped YAML document so sections vaultenv does not own
/// survive a rewrite; typed views are deserialized on demand.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    document: Value,
    config_path: Option<Utf8PathBuf>,
}

impl DeployConfig {
    /// Load configuration from the specified path or search for it
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let (config_path, content) = if let Some(p) = path {
            let content = fs::read_to_string(p).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::config_not_found(p.as_str())
                } else {
                    Error::Io(e)
                }
            })?;
            (p.to_owned(), content)
        } else {
            Self::find_config()?
        };

        debug!("Loading deployment config from {}", config_path);
        let mut config = Self::from_yaml_str(&content)?;
        config.config_path = Some(config_path);
        Ok(config)
    }

    /// Parse a configuration document held in memory
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let document: Value = serde_yaml_ng::from_str(content)?;
        if !document.is_mapping() {
            return Err(Error::invalid_config(
                "deployment config root must be a mapping",
            ));
        }

        Ok(Self {
            document,
            config_path: None,
        })
    }

    /// Find configuration file in current directory or parent directories
    fn find_config() -> Result<(Utf8PathBuf, String)> {
        let cwd = std::env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

        let mut current = cwd.as_path();

        loop {
            for name in CONFIG_FILE_NAMES {
                let path = current.join(name);
                if path.exists() {
                    let content = fs::read_to_string(&path)?;
                    return Ok((path, content));
                }
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        Err(Error::config_not_found(
            "serverless.yml (searched current and parent directories)",
        ))
    }

    /// Path the configuration was loaded from, if any
    pub fn config_path(&self) -> Option<&Utf8Path> {
        self.config_path.as_deref()
    }

    fn section(&self, outer: &str, inner: &str) -> Option<&Value> {
        self.document
            .get(outer)
            .and_then(|o| o.get(inner))
            .filter(|v| !v.is_null())
    }

    /// Keys of `provider.environment`
    pub fn environment_declaration(&self) -> Result<EnvironmentDeclaration> {
        EnvironmentDeclaration::from_yaml(self.section("provider", "environment"))
    }

    /// `provider.region`, used as a KMS region fallback
    pub fn provider_region(&self) -> Option<String> {
        self.section("provider", "region")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Raw `custom.vault` section
    pub fn vault_section(&self) -> Result<VaultSection> {
        match self.section("custom", "vault") {
            Some(value) => serde_yaml_ng::from_value(value.clone()).map_err(Error::from),
            None => Err(Error::missing_field("custom.vault")),
        }
    }

    /// Validated `custom.vault` settings
    pub fn vault_settings(&self) -> Result<VaultSettings> {
        VaultSettings::from_section(&self.vault_section()?)
    }

    /// Validated `custom.kms` settings; `None` when encryption is not configured.
    ///
    /// `region_override` sits between `custom.kms.region` and `provider.region`.
    pub fn kms_settings(&self, region_override: Option<&str>) -> Result<Option<KmsSettings>> {
        let section: KmsSection = match self.section("custom", "kms") {
            Some(value) => serde_yaml_ng::from_value(value.clone())?,
            None => return Ok(None),
        };

        let provider_region = self.provider_region();
        let fallback = region_override.or(provider_region.as_deref());
        KmsSettings::from_section(&section, fallback)
    }

    /// Replace `provider.environment` with exactly the given pairs
    pub fn replace_environment<I>(&mut self, environment: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut block = Mapping::new();
        for (key, value) in environment {
            block.insert(Value::String(key), Value::String(value));
        }

        let root = self
            .document
            .as_mapping_mut()
            .ok_or_else(|| Error::invalid_config("deployment config root must be a mapping"))?;

        let provider_is_mapping = root.get("provider").is_some_and(Value::is_mapping);
        if !provider_is_mapping {
            root.insert(Value::from("provider"), Value::Mapping(Mapping::new()));
        }

        let provider = root
            .get_mut("provider")
            .and_then(Value::as_mapping_mut)
            .ok_or_else(|| Error::invalid_config("provider must be a mapping"))?;
        provider.insert(Value::from("environment"), Value::Mapping(block));
        Ok(())
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(&self.document).map_err(Error::from)
    }

    /// Save configuration back to the file it was loaded from
    pub fn save(&self) -> Result<()> {
        let path = self
            .config_path
            .as_deref()
            .ok_or_else(|| Error::invalid_config("configuration was not loaded from a file"))?;
        self.save_to(path)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Utf8Path) -> Result<()> {
        let content = self.to_yaml()?;
        fs::write(path, content)?;
        Ok(())
    }
}
