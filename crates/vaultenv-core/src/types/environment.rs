//! Declared environment variable names (`provider.environment`)

use crate::error::{Error, Result};
use serde_yaml_ng::Value;

/// The variable names a deployment wants populated. Declared values are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentDeclaration {
    keys: Vec<String>,
}

impl EnvironmentDeclaration {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut declaration = Self::default();
        for key in keys {
            declaration.push(key.into());
        }
        declaration
    }

    /// Read the keys of a YAML mapping; `null` or a missing block is empty
    pub fn from_yaml(value: Option<&Value>) -> Result<Self> {
        let mapping = match value {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Mapping(m)) => m,
            Some(_) => {
                return Err(Error::invalid_config(
                    "provider.environment must be a mapping",
                ))
            }
        };

        let mut declaration = Self::default();
        for key in mapping.keys() {
            let name = match key {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(Error::invalid_config(format!(
                        "unsupported provider.environment key: {:?}",
                        other
                    )))
                }
            };
            declaration.push(name);
        }
        Ok(declaration)
    }

    fn push(&mut self, key: String) {
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
