//! Core types for the secret pipeline

use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret value with automatic zeroing and a redacted `Debug`
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretValue(String);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Coerce a JSON value from the secret store into its string form.
    ///
    /// Strings are taken verbatim, numbers and booleans use their JSON text,
    /// objects and arrays become compact JSON. `null` means absent.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(Self(s.clone())),
            other => Some(Self(other.to_string())),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue([REDACTED {} bytes])", self.0.len())
    }
}

/// Secret key to value mapping; merging is last-write-wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretMap {
    entries: BTreeMap<String, SecretValue>,
}

impl SecretMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `data.data` object of a KV v2 read; `null` values are dropped
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        object
            .iter()
            .filter_map(|(k, v)| SecretValue::from_json(v).map(|v| (k.clone(), v)))
            .collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: SecretValue) -> Option<SecretValue> {
        self.entries.insert(key.into(), value)
    }

    /// Replace the value of an existing key. Unknown keys are ignored.
    pub fn replace_existing(&mut self, key: &str, value: SecretValue) -> bool {
        match self.entries.get_mut(key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Overlay `other` on top of `self`; keys in `other` win
    pub fn merge(&mut self, other: SecretMap) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, key: &str) -> Option<&SecretValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, SecretValue> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, SecretValue)> for SecretMap {
    fn from_iter<T: IntoIterator<Item = (String, SecretValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SecretMap {
    type Item = (&'a String, &'a SecretValue);
    type IntoIter = btree_map::Iter<'a, String, SecretValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Whether a declared key was found in the secret store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyStatus {
    Found,
    NotFound,
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStatus::Found => write!(f, "FOUND"),
            KeyStatus::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}

/// One line of the per-key resolution report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub key: String,
    pub status: KeyStatus,
}

impl Diagnostic {
    pub fn found(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: KeyStatus::Found,
        }
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            status: KeyStatus::NotFound,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.key, self.status)
    }
}

/// Final environment written into the deployment config.
///
/// Only holds keys that were declared and found, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEnvironment {
    entries: Vec<(String, SecretValue)>,
}

impl ResolvedEnvironment {
    pub(crate) fn from_ordered(entries: Vec<(String, SecretValue)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&SecretValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecretValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain key/value pairs for writing into the deployment config
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.expose().to_string()))
            .collect()
    }

    /// The only place resolved variables reach a process environment: the
    /// child command inherits them. The current process is never modified.
    pub fn apply_to_command(&self, command: &mut tokio::process::Command) {
        for (key, value) in &self.entries {
            command.env(key, value.expose());
        }
    }
}
