//! Script repository
//!
//! Persists the [`ScriptLibrary`] as a single JSON blob inside a
//! [`PreferenceStore`]. The whole mapping is loaded and saved at once; the
//! library is small (one entry per customized site) so there is no per-key
//! indexing or migration.

use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use crate::config::{StorageBackend, StorageConfig};
use crate::error::StoreError;
use crate::library::ScriptLibrary;
use crate::preferences::{FilePreferences, MemoryPreferences, PreferenceStore};

/// Preference key the library is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "savedScripts";

/// Durable URL to script mapping.
pub trait ScriptStore: Send + Sync {
    /// Read the full library. A store that was never written yields an empty
    /// library; a corrupt blob is [`StoreError::Decode`].
    fn load(&self) -> Result<ScriptLibrary, StoreError>;

    /// Replace the stored library with `library`.
    fn save(&self, library: &ScriptLibrary) -> Result<(), StoreError>;

    /// Load the library, falling back to an empty one on failure.
    ///
    /// The failure is logged and handed back so the caller can surface it.
    fn load_or_default(&self) -> (ScriptLibrary, Option<StoreError>) {
        match self.load() {
            Ok(library) => (library, None),
            Err(e) => {
                warn!(error = %e, "Failed to load script library, continuing with an empty one");
                (ScriptLibrary::new(), Some(e))
            }
        }
    }

    /// Set (`Some`) or delete (`None`) the script for one URL with a
    /// load-merge-save cycle. Returns the previous script.
    ///
    /// A library that fails to decode is replaced: the change is merged into
    /// an empty one and written back. Storage I/O errors are returned.
    fn update(&self, url: &str, script: Option<&str>) -> Result<Option<String>, StoreError> {
        let library = load_for_update(self)?;
        merge_and_save(self, library, url, script)
    }
}

fn load_for_update<S: ScriptStore + ?Sized>(store: &S) -> Result<ScriptLibrary, StoreError> {
    match store.load() {
        Err(e @ StoreError::Decode(_)) => {
            warn!(error = %e, "Replacing unreadable script library");
            Ok(ScriptLibrary::new())
        }
        result => result,
    }
}

fn merge_and_save<S: ScriptStore + ?Sized>(
    store: &S,
    mut library: ScriptLibrary,
    url: &str,
    script: Option<&str>,
) -> Result<Option<String>, StoreError> {
    let previous = match script {
        Some(script) => library.insert(url, script),
        None => library.remove(url),
    };
    store.save(&library)?;
    Ok(previous)
}

impl<S: ScriptStore + ?Sized> ScriptStore for Arc<S> {
    fn load(&self) -> Result<ScriptLibrary, StoreError> {
        (**self).load()
    }

    fn save(&self, library: &ScriptLibrary) -> Result<(), StoreError> {
        (**self).save(library)
    }

    fn update(&self, url: &str, script: Option<&str>) -> Result<Option<String>, StoreError> {
        (**self).update(url, script)
    }
}

/// [`ScriptStore`] backed by one blob in a [`PreferenceStore`].
#[derive(Debug, Clone)]
pub struct PreferenceScriptStore<P> {
    preferences: P,
    key: String,
}

impl<P: PreferenceStore> PreferenceScriptStore<P> {
    pub fn new(preferences: P) -> Self {
        Self::with_key(preferences, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(preferences: P, key: impl Into<String>) -> Self {
        Self {
            preferences,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn preferences(&self) -> &P {
        &self.preferences
    }
}

impl<P: PreferenceStore> ScriptStore for PreferenceScriptStore<P> {
    fn load(&self) -> Result<ScriptLibrary, StoreError> {
        match self.preferences.get(&self.key)? {
            Some(bytes) => {
                let library = ScriptLibrary::from_json_bytes(&bytes)?;
                debug!(key = %self.key, scripts = library.len(), "Loaded script library");
                Ok(library)
            }
            None => {
                debug!(key = %self.key, "No saved script library, starting empty");
                Ok(ScriptLibrary::new())
            }
        }
    }

    fn save(&self, library: &ScriptLibrary) -> Result<(), StoreError> {
        let bytes = library.to_json_bytes()?;
        self.preferences.set(&self.key, &bytes)?;
        info!(key = %self.key, scripts = library.len(), "Saved script library");
        Ok(())
    }
}

/// Runs each `update` as one load-merge-save under a mutex.
///
/// Writers that go through `update` (sessions completing, CLI edits) keep
/// each other's entries. A plain `save` of a library loaded earlier still
/// replaces everything written in between.
#[derive(Debug)]
pub struct LockedScriptStore<S> {
    inner: S,
    guard: Mutex<()>,
}

impl<S: ScriptStore> LockedScriptStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            guard: Mutex::new(()),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ScriptStore> ScriptStore for LockedScriptStore<S> {
    fn load(&self) -> Result<ScriptLibrary, StoreError> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.load()
    }

    fn save(&self, library: &ScriptLibrary) -> Result<(), StoreError> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        self.inner.save(library)
    }

    fn update(&self, url: &str, script: Option<&str>) -> Result<Option<String>, StoreError> {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let library = load_for_update(&self.inner)?;
        merge_and_save(&self.inner, library, url, script)
    }
}

/// Build the store described by `config`.
pub fn open_store(config: &StorageConfig) -> Arc<dyn ScriptStore> {
    match config.backend {
        StorageBackend::File => {
            debug!(directory = %config.directory.display(), key = %config.key, "Opening file script store");
            Arc::new(LockedScriptStore::new(PreferenceScriptStore::with_key(
                FilePreferences::new(&config.directory),
                &config.key,
            )))
        }
        StorageBackend::Memory => {
            debug!(key = %config.key, "Opening in-memory script store");
            Arc::new(LockedScriptStore::new(PreferenceScriptStore::with_key(
                MemoryPreferences::new(),
                &config.key,
            )))
        }
    }
}
