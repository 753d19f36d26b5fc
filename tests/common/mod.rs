#![allow(dead_code)]

use pagescript::preferences::{FilePreferences, PreferenceStore};
use pagescript::repository::DEFAULT_STORAGE_KEY;
use pagescript::{LockedScriptStore, PreferenceScriptStore, ScriptStore};
use std::sync::Arc;
use tempfile::TempDir;

/// Test context owning a temporary preference directory
pub struct TestContext {
    dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn preferences(&self) -> FilePreferences {
        FilePreferences::new(self.dir.path())
    }

    pub fn store(&self) -> PreferenceScriptStore<FilePreferences> {
        PreferenceScriptStore::new(self.preferences())
    }

    pub fn shared_store(&self) -> Arc<dyn ScriptStore> {
        Arc::new(LockedScriptStore::new(self.store()))
    }

    /// Raw bytes of the persisted library blob, if any.
    pub fn raw_blob(&self) -> Option<Vec<u8>> {
        self.preferences()
            .get(DEFAULT_STORAGE_KEY)
            .expect("Failed to read blob")
    }

    pub fn write_raw_blob(&self, bytes: &[u8]) {
        self.preferences()
            .set(DEFAULT_STORAGE_KEY, bytes)
            .expect("Failed to write blob");
    }
}
