//! Per-page custom scripts for a host browser.
//!
//! The crate keeps a persistent [`ScriptLibrary`] keyed by page URL and runs
//! the two-message exchange with the host browser through
//! [`InjectionSession`]: the host sends page context, the user edits or picks
//! a script, and the finalized script goes back to the host for injection.

pub mod bridge;
pub mod catalog;
pub mod config;
pub mod error;
pub mod library;
pub mod logging;
pub mod message;
pub mod preferences;
pub mod repository;
pub mod session;

pub use catalog::{CANNED_SCRIPTS, CannedScript};
pub use error::{ConfigError, Diagnostic, SessionError, StoreError};
pub use library::{ScriptEntry, ScriptLibrary};
pub use message::{InboundMessage, OutboundMessage};
pub use repository::{LockedScriptStore, PreferenceScriptStore, ScriptStore, open_store};
pub use session::{ActivationContext, Completion, InjectionSession, SessionPhase};

/// Git commit the binary was built from, when known at build time.
pub const GIT_SHA: Option<&str> = option_env!("VERGEN_GIT_SHA");

/// Build timestamp captured at compile time.
pub const BUILD_TIMESTAMP: Option<&str> = option_env!("VERGEN_BUILD_TIMESTAMP");
