//! Key-value preference storage
//!
//! A preference store holds opaque byte blobs under string keys, the way a
//! platform preferences database does. The script repository keeps its whole
//! library as one blob under a single key.

use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::error::StoreError;

/// Blob storage keyed by preference name.
pub trait PreferenceStore: Send + Sync {
    /// Read the blob stored under `key`. A missing key is `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the blob stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Delete `key`. Returns true if a value was removed.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;
}

/// In-memory preferences shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        Ok(values.remove(key).is_some())
    }
}

/// Preferences stored as one file per key inside a directory.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so readers see either the old blob or the new one.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    directory: PathBuf,
}

impl FilePreferences {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.directory.join(format!("{key}.json")))
    }
}

/// Keys must be usable as a single file name inside the preference directory.
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.directory).map_err(|e| StoreError::io(key, e))?;

        let mut file =
            tempfile::NamedTempFile::new_in(&self.directory).map_err(|e| StoreError::io(key, e))?;
        file.write_all(value).map_err(|e| StoreError::io(key, e))?;
        file.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(key, e))?;
        file.persist(&path)
            .map_err(|e| StoreError::io(key, e.error))?;

        debug!(key = %key, path = %path.display(), bytes = value.len(), "Wrote preference");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(key, e)),
        }
    }
}
