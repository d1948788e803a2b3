//! Structured file requests embedded in model replies.
//!
//! The model ends a reply with a JSON object fenced by [`BLOCK_START`] and
//! [`BLOCK_END`] when it wants the caller to deliver a document:
//!
//! ```text
//! İstediğiniz form ektedir.
//! JSON_START
//! { "action": "generate_file", "filename": "FR-004 Ders Muafiyet Formu.docx", "data": {} }
//! JSON_END
//! ```
//!
//! [`extract_action`] splits such a reply into the visible text and the
//! parsed [`ActionBlock`]. A block that fails to parse is left in the
//! visible text untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const BLOCK_START: &str = "JSON_START";
pub const BLOCK_END: &str = "JSON_END";

/// Rendered in place of falsy template values.
pub const EMPTY_VALUE: &str = "-";

/// Actions that ask for a file to be delivered.
pub const FILE_ACTIONS: [&str; 2] = ["generate_file", "generate_pdf"];

/// The parsed contents of a reply block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBlock {
    pub action: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl ActionBlock {
    pub fn is_file_request(&self) -> bool {
        FILE_ACTIONS.contains(&self.action.as_str()) && !self.filename.trim().is_empty()
    }

    /// Convert into a [`FileRequest`] when the action asks for a file.
    pub fn into_file_request(self) -> Option<FileRequest> {
        if !self.is_file_request() {
            return None;
        }
        Some(FileRequest {
            filename: self.filename.trim().to_string(),
            data: self.data,
        })
    }
}

/// A request for one document, consumed once by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileRequest {
    pub filename: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl FileRequest {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            data: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Key/value rows for a synthesized document, in insertion order.
    pub fn template_rows(&self) -> Vec<(String, String)> {
        template_rows(&self.data)
    }
}

/// Split a reply into visible text and an optional action block.
///
/// Only the first fenced block is considered. When it parses, it is removed
/// and the remaining text is trimmed; otherwise the reply is returned as is.
pub fn extract_action(reply: &str) -> (String, Option<ActionBlock>) {
    let Some(start) = reply.find(BLOCK_START) else {
        return (reply.to_string(), None);
    };
    let body_start = start + BLOCK_START.len();
    let Some(body_len) = reply[body_start..].find(BLOCK_END) else {
        return (reply.to_string(), None);
    };
    let body_end = body_start + body_len;

    match serde_json::from_str::<ActionBlock>(reply[body_start..body_end].trim()) {
        Ok(block) => {
            let visible = format!("{}{}", &reply[..start], &reply[body_end + BLOCK_END.len()..]);
            (visible.trim().to_string(), Some(block))
        }
        Err(_) => (reply.to_string(), None),
    }
}

/// Render template data as `(key, value)` rows, skipping the `action` key.
pub fn template_rows(data: &Map<String, Value>) -> Vec<(String, String)> {
    data.iter()
        .filter(|(key, _)| key.as_str() != "action")
        .map(|(key, value)| (key.clone(), render_value(value)))
        .collect()
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => EMPTY_VALUE.to_string(),
        Value::String(s) if s.is_empty() => EMPTY_VALUE.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) if n.as_f64() == Some(0.0) => EMPTY_VALUE.to_string(),
        other => other.to_string(),
    }
}
