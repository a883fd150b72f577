//! Payload assembly.

use crate::config::Configuration;
use crate::types::{EncodedAttachment, Payload};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Build the wire payload for one user turn.
///
/// `timestamp` is the creation time of the user message, not the send time.
pub fn build_payload(
    user_content: &str,
    attachments: Vec<EncodedAttachment>,
    config: &Configuration,
    timestamp: DateTime<Utc>,
) -> Payload {
    Payload {
        system: config.system_prompt.clone(),
        input: user_content.to_string(),
        attachments,
        temperature: config.sampling_temperature,
        timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

/// Pretty JSON of a payload with attachment bodies elided, for display.
pub fn preview_payload(payload: &Payload) -> String {
    render_preview(payload, |a| format!("<{} base64 chars>", a.base64.len()))
}

/// Preview for attachments that are staged but not read yet.
///
/// Bodies are read at send time, so only the staged size is shown.
pub fn preview_staged_payload(payload: &Payload) -> String {
    render_preview(payload, |a| format!("<{} bytes, read at send time>", a.size))
}

fn render_preview(payload: &Payload, body: impl Fn(&EncodedAttachment) -> String) -> String {
    let mut value = match serde_json::to_value(payload) {
        Ok(v) => v,
        Err(_) => return String::new(),
    };
    if let Some(items) = value.get_mut("attachments").and_then(Value::as_array_mut) {
        for (item, attachment) in items.iter_mut().zip(&payload.attachments) {
            if let Some(slot) = item.get_mut("base64") {
                *slot = Value::String(body(attachment));
            }
        }
    }
    serde_json::to_string_pretty(&value).unwrap_or_default()
}
