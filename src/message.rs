//! Host message shapes
//!
//! The host browser delivers page context as a property-list style
//! dictionary wrapped in an extension item, and expects the finalized script
//! back in the same wrapping:
//!
//! ```text
//! inbound:  { "attachments": [ { PREPROCESSING_RESULTS_KEY: { "title": .., "URL": .. } } ] }
//! outbound: { "attachments": [ { FINALIZE_ARGUMENT_KEY: { "customJavaScript": .. } } ] }
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::SessionError;

/// Attachment key carrying the page inspection results from the host.
pub const PREPROCESSING_RESULTS_KEY: &str = "NSExtensionJavaScriptPreprocessingResultsKey";

/// Attachment key carrying the finalize argument back to the host.
pub const FINALIZE_ARGUMENT_KEY: &str = "NSExtensionJavaScriptFinalizeArgumentKey";

const ATTACHMENTS: &str = "attachments";

/// Page context delivered by the host when a session starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessage {
    pub page_title: String,
    pub page_url: String,
}

impl InboundMessage {
    pub fn new(page_title: impl Into<String>, page_url: impl Into<String>) -> Self {
        Self {
            page_title: page_title.into(),
            page_url: page_url.into(),
        }
    }

    /// Extract page context from a host extension item.
    ///
    /// Accepts the full item, a single attachment dictionary, or the bare
    /// results dictionary. Missing or non-string `title`/`URL` fields default
    /// to empty strings; a missing results dictionary is
    /// [`SessionError::MissingContext`].
    pub fn from_extension_item(item: &Value) -> Result<Self, SessionError> {
        let results = preprocessing_results(item)?;
        let field = |name: &str| {
            results
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Ok(Self {
            page_title: field("title"),
            page_url: field("URL"),
        })
    }

    /// Parse a raw JSON extension item.
    pub fn from_json(raw: &str) -> Result<Self, SessionError> {
        let item: Value = serde_json::from_str(raw)
            .map_err(|e| SessionError::MissingContext(format!("unparseable message: {e}")))?;
        Self::from_extension_item(&item)
    }

    /// Wrap this context the way the host delivers it.
    pub fn to_extension_item(&self) -> Value {
        let results = serde_json::json!({
            "title": self.page_title,
            "URL": self.page_url,
        });
        wrap_attachment(PREPROCESSING_RESULTS_KEY, results)
    }
}

fn preprocessing_results(item: &Value) -> Result<&Map<String, Value>, SessionError> {
    let object = item
        .as_object()
        .ok_or_else(|| SessionError::MissingContext("extension item is not a dictionary".into()))?;

    if let Some(attachments) = object.get(ATTACHMENTS) {
        let first = attachments
            .as_array()
            .and_then(|list| list.first())
            .ok_or_else(|| SessionError::MissingContext("extension item has no attachments".into()))?;
        return first
            .get(PREPROCESSING_RESULTS_KEY)
            .and_then(Value::as_object)
            .ok_or_else(|| {
                SessionError::MissingContext("attachment has no preprocessing results".into())
            });
    }

    if let Some(results) = object.get(PREPROCESSING_RESULTS_KEY) {
        return results.as_object().ok_or_else(|| {
            SessionError::MissingContext("preprocessing results are not a dictionary".into())
        });
    }

    if object.contains_key("title") || object.contains_key("URL") {
        return Ok(object);
    }

    Err(SessionError::MissingContext(
        "no preprocessing results in extension item".into(),
    ))
}

fn wrap_attachment(key: &str, payload: Value) -> Value {
    let mut attachment = Map::new();
    attachment.insert(key.to_string(), payload);

    let mut item = Map::new();
    item.insert(
        ATTACHMENTS.to_string(),
        Value::Array(vec![Value::Object(attachment)]),
    );
    Value::Object(item)
}

/// Finalized script handed back to the host for injection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutboundMessage {
    #[serde(rename = "customJavaScript")]
    pub custom_javascript: String,
}

impl OutboundMessage {
    pub fn new(custom_javascript: impl Into<String>) -> Self {
        Self {
            custom_javascript: custom_javascript.into(),
        }
    }

    /// The `{ "customJavaScript": .. }` finalize argument.
    pub fn argument(&self) -> Value {
        serde_json::json!({ "customJavaScript": self.custom_javascript })
    }

    /// The argument wrapped in the host's extension item convention.
    pub fn to_extension_item(&self) -> Value {
        wrap_attachment(FINALIZE_ARGUMENT_KEY, self.argument())
    }

    /// Read the finalize argument back out of an extension item.
    pub fn from_extension_item(item: &Value) -> Option<Self> {
        let argument = item
            .get(ATTACHMENTS)?
            .as_array()?
            .first()?
            .get(FINALIZE_ARGUMENT_KEY)?;
        serde_json::from_value(argument.clone()).ok()
    }
}
