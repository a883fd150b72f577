//! 响应归一化：将任意形态的后端响应转换为统一的助手消息。
//!
//! Response normalization.
//!
//! Backends answer in many shapes. Resolution order, first match wins:
//!
//! 1. an object with a `messages` array: the first entry whose `role` is
//!    `assistant` provides the content;
//! 2. plain text (or a JSON string): used verbatim;
//! 3. any other value: its non-empty string `content` field, or the whole
//!    value pretty-printed.

use crate::transport::RawResponse;
use crate::types::Message;
use serde_json::Value;

/// Content used when the assistant entry carries no content.
pub const MISSING_CONTENT: &str = "(no content provided)";

/// Map a raw response onto a fresh assistant message.
pub fn normalize(raw: &RawResponse) -> Message {
    Message::assistant(extract_content(raw))
}

/// Content resolution without the message envelope.
pub fn extract_content(raw: &RawResponse) -> String {
    let value = match raw {
        RawResponse::Text(text) => return text.clone(),
        RawResponse::Json(value) => value,
    };

    if let Some(content) = from_messages(value) {
        return content;
    }

    if let Value::String(text) = value {
        return text.clone();
    }

    match value.get("content") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => pretty(value),
    }
}

fn from_messages(value: &Value) -> Option<String> {
    let messages = value.get("messages")?.as_array()?;
    let assistant = messages
        .iter()
        .find(|m| m.get("role").and_then(Value::as_str) == Some("assistant"))?;

    let content = match assistant.get("content") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        None | Some(Value::Null) | Some(Value::String(_)) => MISSING_CONTENT.to_string(),
        Some(other) => pretty(other),
    };
    Some(content)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
