//! The persisted URL to script mapping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StoreError;

/// Borrowed view of one library mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptEntry<'a> {
    pub url: &'a str,
    pub script: &'a str,
}

/// Mapping from page URL to the custom script for that page.
///
/// URLs are matched exactly; no normalization is applied, so
/// `https://example.com` and `https://example.com/` are distinct pages.
/// Entries are kept sorted by URL, which makes the encoded blob
/// deterministic for a given mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptLibrary {
    scripts: BTreeMap<String, String>,
}

impl ScriptLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script stored for `url`, if any.
    pub fn get(&self, url: &str) -> Option<&str> {
        self.scripts.get(url).map(String::as_str)
    }

    /// Store `script` for `url`, returning the script it replaced.
    pub fn insert(&mut self, url: impl Into<String>, script: impl Into<String>) -> Option<String> {
        self.scripts.insert(url.into(), script.into())
    }

    pub fn remove(&mut self, url: &str) -> Option<String> {
        self.scripts.remove(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.scripts.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Iterate over all entries in URL order.
    pub fn entries(&self) -> impl Iterator<Item = ScriptEntry<'_>> {
        self.scripts.iter().map(|(url, script)| ScriptEntry {
            url: url.as_str(),
            script: script.as_str(),
        })
    }

    /// Serialize the whole mapping as a JSON object.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(self).map_err(StoreError::Encode)
    }

    /// Parse a JSON object of string to string.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        serde_json::from_slice(bytes).map_err(StoreError::Decode)
    }
}

impl<U: Into<String>, S: Into<String>> FromIterator<(U, S)> for ScriptLibrary {
    fn from_iter<I: IntoIterator<Item = (U, S)>>(iter: I) -> Self {
        Self {
            scripts: iter
                .into_iter()
                .map(|(url, script)| (url.into(), script.into()))
                .collect(),
        }
    }
}
