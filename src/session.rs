//! Injection sessions
//!
//! One session mediates exactly one request/response round-trip with the
//! host browser:
//!
//! 1. [`InjectionSession::begin`] receives the page context, loads the
//!    library and seeds the working script from it.
//! 2. The collaborator edits the working script for as long as the user
//!    needs, or picks a canned script.
//! 3. [`InjectionSession::complete`] stores the working script for the page
//!    through [`ScriptStore::update`] and returns the message for the host.
//!    Entries other sessions wrote in the meantime are kept.
//!
//! Dropping a session without completing it persists nothing.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::CannedScript;
use crate::error::{Diagnostic, SessionError};
use crate::message::{InboundMessage, OutboundMessage};
use crate::repository::ScriptStore;

/// Per-session page context and the script being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationContext {
    pub page_title: String,
    pub page_url: String,
    pub working_script: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No page context has been received yet.
    Idle,
    /// Page context received; the working script is being edited.
    AwaitingInput,
}

/// Result of completing a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Message for the host. Produced even when persistence failed.
    pub response: OutboundMessage,
    /// Whether the library was written back.
    pub persisted: bool,
    /// Recovered failures collected over the session's lifetime.
    pub diagnostics: Vec<Diagnostic>,
}

pub struct InjectionSession {
    store: Arc<dyn ScriptStore>,
    phase: SessionPhase,
    context: ActivationContext,
    diagnostics: Vec<Diagnostic>,
}

impl InjectionSession {
    pub fn new(store: Arc<dyn ScriptStore>) -> Self {
        Self {
            store,
            phase: SessionPhase::Idle,
            context: ActivationContext::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Start the session from a host extension item.
    ///
    /// If the item carries no page context the session stays idle and the
    /// error is recorded as a diagnostic.
    pub fn begin(&mut self, item: &Value) -> Result<&ActivationContext, SessionError> {
        if self.phase == SessionPhase::AwaitingInput {
            return Err(SessionError::AlreadyStarted(self.context.page_url.clone()));
        }

        match InboundMessage::from_extension_item(item) {
            Ok(message) => Ok(self.begin_with(message)),
            Err(e) => {
                warn!(error = %e, "Ignoring inbound message without page context");
                self.diagnostics
                    .push(Diagnostic::MissingContext(e.to_string()));
                Err(e)
            }
        }
    }

    /// Start the session from an already parsed message.
    ///
    /// A library that fails to load is replaced by an empty one; the page
    /// title and URL are populated either way.
    pub fn begin_with(&mut self, message: InboundMessage) -> &ActivationContext {
        let (library, error) = self.store.load_or_default();
        if let Some(e) = error {
            self.diagnostics.push(Diagnostic::LibraryLoad(e.to_string()));
        }

        let working_script = library
            .get(&message.page_url)
            .unwrap_or_default()
            .to_string();

        debug!(
            page_url = %message.page_url,
            page_title = %message.page_title,
            has_saved_script = library.contains(&message.page_url),
            "Session awaiting input"
        );

        self.context = ActivationContext {
            page_title: message.page_title,
            page_url: message.page_url,
            working_script,
        };
        self.phase = SessionPhase::AwaitingInput;
        &self.context
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::AwaitingInput
    }

    pub fn context(&self) -> &ActivationContext {
        &self.context
    }

    pub fn page_title(&self) -> &str {
        &self.context.page_title
    }

    pub fn page_url(&self) -> &str {
        &self.context.page_url
    }

    pub fn working_script(&self) -> &str {
        &self.context.working_script
    }

    pub fn set_working_script(&mut self, script: impl Into<String>) {
        self.context.working_script = script.into();
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Replace the working script with a canned one and complete immediately.
    pub fn select_canned(mut self, canned: CannedScript) -> Completion {
        debug!(index = canned.index(), "Selected canned script");
        self.set_working_script(canned.script());
        self.complete()
    }

    /// Persist the working script for the page and build the host response.
    ///
    /// Never fails: a save error is logged and reported in
    /// [`Completion::diagnostics`], and the response is returned regardless.
    pub fn complete(self) -> Completion {
        let Self {
            store,
            phase,
            context,
            mut diagnostics,
        } = self;

        let persisted = match phase {
            SessionPhase::AwaitingInput => {
                match store.update(&context.page_url, Some(&context.working_script)) {
                    Ok(_) => {
                        info!(page_url = %context.page_url, "Stored script for page");
                        true
                    }
                    Err(e) => {
                        warn!(page_url = %context.page_url, error = %e, "Failed to save script library");
                        diagnostics.push(Diagnostic::LibrarySave(e.to_string()));
                        false
                    }
                }
            }
            SessionPhase::Idle => {
                warn!("Completing a session that never received page context, nothing stored");
                diagnostics.push(Diagnostic::MissingContext(
                    "session completed before page context arrived".to_string(),
                ));
                false
            }
        };

        Completion {
            response: OutboundMessage::new(context.working_script),
            persisted,
            diagnostics,
        }
    }

    /// Discard the session without touching the library.
    pub fn abandon(self) {
        debug!(page_url = %self.context.page_url, "Session abandoned, nothing stored");
    }
}

impl std::fmt::Debug for InjectionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionSession")
            .field("phase", &self.phase)
            .field("context", &self.context)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}
