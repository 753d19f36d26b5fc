//! Error types for the script library and injection sessions.
//!
//! None of these errors is fatal to a session. Store and session code
//! recovers from each of them with a safe default and reports it back to
//! the caller as a [`Diagnostic`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised by the preference store and the script library codec.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored library blob could not be parsed.
    #[error("failed to decode script library: {0}")]
    Decode(#[source] serde_json::Error),

    /// The library could not be serialized.
    #[error("failed to encode script library: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("preference storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid preference key '{0}'")]
    InvalidKey(String),
}

impl StoreError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// Failures in the host message exchange.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The inbound message lacked the page context dictionary.
    #[error("inbound message is missing page context: {0}")]
    MissingContext(String),

    #[error("a session for '{0}' is already awaiting input")]
    AlreadyStarted(String),

    #[error("unknown canned script index {index} (catalog has {available} entries)")]
    UnknownCannedScript { index: usize, available: usize },
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// A recovered, non-blocking failure reported alongside a session result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The library could not be loaded; the session continued with an empty one.
    LibraryLoad(String),
    /// The library could not be saved; the response was still returned.
    LibrarySave(String),
    /// No usable page context arrived from the host.
    MissingContext(String),
}

impl Diagnostic {
    pub fn message(&self) -> &str {
        match self {
            Diagnostic::LibraryLoad(message)
            | Diagnostic::LibrarySave(message)
            | Diagnostic::MissingContext(message) => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_serializes_with_kind_tag() {
        let diagnostic = Diagnostic::LibrarySave("disk full".to_string());
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "library_save", "message": "disk full"})
        );
        assert_eq!(diagnostic.message(), "disk full");
    }

    #[test]
    fn test_unknown_canned_script_message() {
        let err = SessionError::UnknownCannedScript {
            index: 5,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "unknown canned script index 5 (catalog has 2 entries)"
        );
    }
}
