//! Wire-format request body

use serde::{Deserialize, Serialize};

/// Transport form of one staged file.
///
/// Lives only for the duration of a dispatch; the thread keeps an
/// [`AttachmentRef`](super::AttachmentRef) instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedAttachment {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: Option<i64>,
    /// Standard base64 of the file body.
    pub base64: String,
}

/// Canonical body sent to the backend, built fresh for every dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub system: String,
    pub input: String,
    pub attachments: Vec<EncodedAttachment>,
    pub temperature: f64,
    /// RFC 3339 instant at which the user message was created.
    pub timestamp: String,
}
