//! Line-delimited JSON host bridge
//!
//! Drives [`InjectionSession`]s for a host that talks over a byte stream.
//! Every input line is one [`HostRequest`] and produces exactly one
//! [`HostResponse`] line. Bad input is answered with an error response and
//! the bridge keeps reading.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::catalog::{CANNED_SCRIPTS, CannedScript};
use crate::error::Diagnostic;
use crate::repository::ScriptStore;
use crate::session::{Completion, InjectionSession};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostRequest {
    /// Host hands over the page context extension item.
    Begin { item: Value },
    /// Replace the working script.
    Edit { script: String },
    /// Pick a canned script and complete.
    Select { index: usize },
    Complete,
    Abandon,
    Catalog,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostResponse {
    Context {
        #[serde(rename = "pageTitle")]
        page_title: String,
        #[serde(rename = "pageURL")]
        page_url: String,
        #[serde(rename = "workingScript")]
        working_script: String,
    },
    Edited,
    /// Finalized script in the host's extension item wrapping.
    Complete {
        item: Value,
        persisted: bool,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        diagnostics: Vec<Diagnostic>,
    },
    Abandoned,
    Catalog {
        scripts: Vec<String>,
    },
    Error {
        message: String,
    },
}

impl HostResponse {
    fn error(message: impl Into<String>) -> Self {
        HostResponse::Error {
            message: message.into(),
        }
    }
}

impl From<Completion> for HostResponse {
    fn from(completion: Completion) -> Self {
        HostResponse::Complete {
            item: completion.response.to_extension_item(),
            persisted: completion.persisted,
            diagnostics: completion.diagnostics,
        }
    }
}

/// Runs one session at a time against a shared store.
pub struct HostBridge {
    store: Arc<dyn ScriptStore>,
    session: Option<InjectionSession>,
    completed: usize,
}

impl HostBridge {
    pub fn new(store: Arc<dyn ScriptStore>) -> Self {
        Self {
            store,
            session: None,
            completed: 0,
        }
    }

    /// Number of sessions completed so far.
    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn handle(&mut self, request: HostRequest) -> HostResponse {
        match request {
            HostRequest::Begin { item } => {
                let store = Arc::clone(&self.store);
                let session = self
                    .session
                    .get_or_insert_with(|| InjectionSession::new(store));
                match session.begin(&item) {
                    Ok(context) => HostResponse::Context {
                        page_title: context.page_title.clone(),
                        page_url: context.page_url.clone(),
                        working_script: context.working_script.clone(),
                    },
                    Err(e) => HostResponse::error(e.to_string()),
                }
            }
            HostRequest::Edit { script } => match self.session.as_mut() {
                Some(session) => {
                    session.set_working_script(script);
                    HostResponse::Edited
                }
                None => HostResponse::error("no session to edit"),
            },
            HostRequest::Select { index } => {
                let canned = match CannedScript::try_from(index) {
                    Ok(canned) => canned,
                    Err(e) => return HostResponse::error(e.to_string()),
                };
                match self.session.take() {
                    Some(session) => self.finish(session.select_canned(canned)),
                    None => HostResponse::error("no session to complete"),
                }
            }
            HostRequest::Complete => match self.session.take() {
                Some(session) => self.finish(session.complete()),
                None => HostResponse::error("no session to complete"),
            },
            HostRequest::Abandon => {
                if let Some(session) = self.session.take() {
                    session.abandon();
                }
                HostResponse::Abandoned
            }
            HostRequest::Catalog => HostResponse::Catalog {
                scripts: CANNED_SCRIPTS.iter().map(|s| s.to_string()).collect(),
            },
        }
    }

    pub fn handle_line(&mut self, line: &str) -> HostResponse {
        match serde_json::from_str::<HostRequest>(line) {
            Ok(request) => self.handle(request),
            Err(e) => {
                warn!(error = %e, "Malformed host request");
                HostResponse::error(format!("malformed request: {e}"))
            }
        }
    }

    fn finish(&mut self, completion: Completion) -> HostResponse {
        self.completed += 1;
        completion.into()
    }

    /// Serve requests until the reader is exhausted.
    ///
    /// A session still open at end of input is abandoned. Returns the number
    /// of completed sessions.
    pub async fn run<R, W>(mut self, reader: R, mut writer: W) -> std::io::Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            let mut encoded = serde_json::to_vec(&response).map_err(std::io::Error::other)?;
            encoded.push(b'\n');
            writer.write_all(&encoded).await?;
            writer.flush().await?;
        }

        if let Some(session) = self.session.take() {
            debug!("Host closed the stream with a session open");
            session.abandon();
        }
        Ok(self.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::MemoryPreferences;
    use crate::repository::PreferenceScriptStore;
    use serde_json::json;

    fn bridge() -> HostBridge {
        HostBridge::new(Arc::new(PreferenceScriptStore::new(MemoryPreferences::new())))
    }

    #[test]
    fn test_request_tags() {
        let request: HostRequest = serde_json::from_str(r#"{"type":"select","index":1}"#).unwrap();
        assert_eq!(request, HostRequest::Select { index: 1 });

        let request: HostRequest = serde_json::from_str(r#"{"type":"complete"}"#).unwrap();
        assert_eq!(request, HostRequest::Complete);
    }

    #[test]
    fn test_edit_without_session_is_error() {
        let mut bridge = bridge();
        let response = bridge.handle(HostRequest::Edit {
            script: "x".to_string(),
        });
        assert!(matches!(response, HostResponse::Error { .. }));
    }

    #[test]
    fn test_bad_canned_index_keeps_session() {
        let mut bridge = bridge();
        bridge.handle(HostRequest::Begin {
            item: json!({"title": "T", "URL": "https://t.example"}),
        });

        let response = bridge.handle(HostRequest::Select { index: 9 });

        assert!(matches!(response, HostResponse::Error { .. }));
        assert!(bridge.has_session());
        assert_eq!(bridge.completed(), 0);
    }

    #[test]
    fn test_response_serialization() {
        let response = HostResponse::Context {
            page_title: "T".to_string(),
            page_url: "https://t.example".to_string(),
            working_script: String::new(),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"type": "context", "pageTitle": "T", "pageURL": "https://t.example", "workingScript": ""})
        );
        assert_eq!(
            serde_json::to_value(HostResponse::Abandoned).unwrap(),
            json!({"type": "abandoned"})
        );
    }
}
