use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::preferences::validate_key;
use crate::repository::DEFAULT_STORAGE_KEY;

/// Config file read from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "pagescript.toml";

/// Prefix for environment overrides, e.g. `PAGESCRIPT_STORAGE__KEY`.
pub const ENV_PREFIX: &str = "PAGESCRIPT_";

/// Configuration for pagescript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory holding the preference files (file backend only).
    pub directory: PathBuf,
    /// Preference key the library blob is stored under.
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            directory: default_storage_directory(),
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

fn default_storage_directory() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() => PathBuf::from(home).join(".pagescript"),
        _ => PathBuf::from(".pagescript"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Layered provider: defaults, then the TOML file, then environment.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "storage.key".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.storage.backend == StorageBackend::File {
            if self.storage.directory.as_os_str().is_empty() {
                return Err(ConfigError::Invalid {
                    key: "storage.directory".to_string(),
                    reason: "required for the file backend".to_string(),
                });
            }
            validate_key(&self.storage.key).map_err(|e| ConfigError::Invalid {
                key: "storage.key".to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// In-memory configuration for tests.
    pub fn test_config() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                ..StorageConfig::default()
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.storage.key, "savedScripts");
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let mut config = Config::test_config();
        config.storage.key = "  ".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("storage.key"));
    }

    #[test]
    fn test_file_backend_rejects_path_like_key() {
        let mut config = Config::default();
        for key in ["saved/scripts", ".hidden", "a b"] {
            config.storage.key = key.to_string();
            assert!(config.validate().is_err(), "key {key:?} should be rejected");
        }

        // The memory backend has no file name constraints.
        config.storage.backend = StorageBackend::Memory;
        config.storage.key = "saved/scripts".to_string();
        assert!(config.validate().is_ok());
    }
}
