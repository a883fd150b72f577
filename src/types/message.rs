//! Conversation thread messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PLACEHOLDER_CONTENT: &str = "The agent is thinking...";

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// One entry of the rendered conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub loading: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            role,
            content: content.into(),
            attachments: Vec::new(),
            timestamp: Utc::now(),
            loading: false,
            is_error: false,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }

    /// Transient assistant entry shown while a dispatch is in flight.
    pub fn placeholder() -> Self {
        Self {
            loading: true,
            ..Self::assistant(PLACEHOLDER_CONTENT)
        }
    }

    /// Assistant entry describing a failed dispatch.
    pub fn error(reason: impl std::fmt::Display) -> Self {
        Self {
            is_error: true,
            ..Self::assistant(format!("⚠️ dispatch failed: {}", reason))
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<AttachmentRef>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Label used by front ends when rendering the thread.
    pub fn label(&self) -> &'static str {
        match self {
            MessageRole::System => "System",
            MessageRole::User => "You",
            MessageRole::Assistant => "Agent",
        }
    }
}

/// Display form of an attachment; the file body never lives in the thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    pub size: u64,
}

impl AttachmentRef {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    /// Size rendered the way attachment chips show it, e.g. `1.5 KB`.
    pub fn size_label(&self) -> String {
        format!("{:.1} KB", self.size as f64 / 1024.0)
    }
}
