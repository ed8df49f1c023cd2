//! Secret paths and their KV v2 request URLs

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Segment inserted after the mount for KV v2 reads
const KV2_DATA_SEGMENT: &str = "data";

/// `custom.vault.paths`: either one path or a list of paths
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SecretPaths {
    One(String),
    Many(Vec<String>),
}

impl SecretPaths {
    /// Normalize into an ordered list, parsing each entry
    pub fn to_paths(&self) -> Result<Vec<SecretPath>> {
        let raw: Vec<&str> = match self {
            SecretPaths::One(p) => vec![p.as_str()],
            SecretPaths::Many(list) => list.iter().map(String::as_str).collect(),
        };

        if raw.is_empty() {
            return Err(Error::invalid_config("custom.vault.paths is empty"));
        }

        raw.into_iter().map(SecretPath::parse).collect()
    }
}

/// A logical secret location, `<mount>/<subpath...>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretPath {
    raw: String,
    mount: String,
    subpath: Vec<String>,
}

impl SecretPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim().trim_matches('/');
        let mut segments = trimmed.split('/');

        let mount = match segments.next() {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => {
                return Err(Error::invalid_config(format!(
                    "secret path '{}' has no mount segment",
                    raw
                )))
            }
        };

        let subpath: Vec<String> = segments.map(str::to_string).collect();
        if subpath.iter().any(String::is_empty) {
            return Err(Error::invalid_config(format!(
                "secret path '{}' contains an empty segment",
                raw
            )));
        }

        // Relative segments would escape the `<mount>/data/` prefix
        if std::iter::once(&mount)
            .chain(subpath.iter())
            .any(|s| s == "." || s == "..")
        {
            return Err(Error::invalid_config(format!(
                "secret path '{}' contains a relative segment",
                raw
            )));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            mount,
            subpath,
        })
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    pub fn subpath(&self) -> &[String] {
        &self.subpath
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Build `<base>/v1/<mount>/data/<subpath...>`.
    ///
    /// Segments are percent-encoded, so `?` and `#` stay part of the path.
    pub fn request_url(&self, base: &Url) -> Result<Url> {
        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);

        url.path_segments_mut()
            .map_err(|_| {
                Error::invalid_config(format!(
                    "cannot build request URL for '{}': '{}' cannot be a base URL",
                    self.raw, base
                ))
            })?
            .pop_if_empty()
            .push("v1")
            .push(&self.mount)
            .push(KV2_DATA_SEGMENT)
            .extend(self.subpath.iter());

        Ok(url)
    }
}

impl fmt::Display for SecretPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
