//! 调度编排：一次用户发送对应一条完整的异步请求链。
//!
//! Dispatch orchestration.
//!
//! Each send runs one chain, `Encode → Build → Transport → Normalize`, as its
//! own tokio task with a single error boundary:
//!
//! ```text
//! Composing → Submitted → (Mocking | Sending) → Normalizing → Settled{Success | Failed}
//! ```
//!
//! The user message and a loading placeholder are appended synchronously at
//! submission. When the chain settles, the placeholder (found by id) is
//! replaced with the normalized reply or an error message. Chains are
//! independent: several may be in flight, none can be cancelled, and each
//! touches only its own placeholder.

mod builder;
pub mod observer;

pub use builder::OrchestratorBuilder;
pub use observer::{
    noop_observer, DispatchEvent, DispatchObserver, NoopObserver, RecordingObserver, StatusState,
};

use crate::attachments::{attachment_refs, encode_attachments, StagedFile};
use crate::config::{SettingsUpdate, SharedConfig};
use crate::conversation::{Composer, Conversation, StagedAttachment, Submission};
use crate::request::{build_payload, preview_staged_payload};
use crate::response::normalize;
use crate::transport::TransportClient;
use crate::types::{AttachmentRef, Message};
use crate::Result;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Status label while a dispatch is in flight.
pub const LABEL_DISPATCHING: &str = "dispatching";
/// Status label after a failed dispatch.
pub const LABEL_DISPATCH_ERROR: &str = "dispatch error";

pub(crate) struct Inner {
    pub(crate) config: SharedConfig,
    pub(crate) transport: TransportClient,
    pub(crate) conversation: Mutex<Conversation>,
    pub(crate) composer: Mutex<Composer>,
    pub(crate) observer: Arc<dyn DispatchObserver>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of the conversation, the composer and the dispatch lifecycle.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct DispatchOrchestrator {
    pub(crate) inner: Arc<Inner>,
}

/// A dispatch in flight.
pub struct DispatchHandle {
    placeholder_id: String,
    task: JoinHandle<Message>,
}

impl DispatchHandle {
    pub fn placeholder_id(&self) -> &str {
        &self.placeholder_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the chain to settle and return the message that replaced the placeholder.
    pub async fn settled(self) -> Message {
        match self.task.await {
            Ok(message) => message,
            Err(e) => Message::error(e),
        }
    }
}

impl DispatchOrchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Handle to the live configuration.
    pub fn config(&self) -> SharedConfig {
        self.inner.config.clone()
    }

    /// Snapshot of the thread.
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.inner.conversation).messages().to_vec()
    }

    pub fn message_count(&self) -> usize {
        lock(&self.inner.conversation).message_count()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.inner.conversation).pending_count()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        lock(&self.inner.composer).set_text(text);
    }

    /// Stage a file for the next send; returns its staging id.
    pub fn stage_file(&self, file: StagedFile) -> String {
        lock(&self.inner.composer).stage(file)
    }

    pub fn remove_staged(&self, id: &str) -> bool {
        lock(&self.inner.composer).remove(id)
    }

    pub fn staged(&self) -> Vec<StagedAttachment> {
        lock(&self.inner.composer).staged().to_vec()
    }

    pub fn staged_count(&self) -> usize {
        lock(&self.inner.composer).staged_count()
    }

    /// Drop the thread and re-seed it with the current system prompt.
    pub fn clear_conversation(&self) {
        let config = self.inner.config.load();
        lock(&self.inner.conversation).clear(&config.system_prompt);
    }

    /// Validate and publish edited settings. The next dispatch sees them.
    pub fn apply_settings(&self, update: SettingsUpdate) -> Result<()> {
        let config = update.into_config()?;
        lock(&self.inner.conversation).sync_system_prompt(&config.system_prompt);
        let label = config.mode_label();
        self.inner.config.store(config);
        info!(mode = label, "settings updated");
        self.announce_idle(label);
        Ok(())
    }

    /// Flip mock responses on or off, keeping every other setting as loaded.
    pub fn set_mock_mode(&self, enabled: bool) {
        let config = self.inner.config.update(|c| c.mock_mode = enabled);
        let label = config.mode_label();
        info!(mode = label, "mock mode toggled");
        self.announce_idle(label);
    }

    // An in-flight dispatch owns the status until it settles.
    fn announce_idle(&self, label: &str) {
        if self.pending_count() == 0 {
            self.inner
                .observer
                .on_status_change(StatusState::Idle, label);
        }
    }

    /// Preview of the payload the composer would produce right now.
    ///
    /// Attachment bodies are not read; each shows its staged size instead.
    pub fn preview(&self) -> String {
        let (text, files) = {
            let composer = lock(&self.inner.composer);
            let files: Vec<StagedFile> = composer.staged().iter().map(|a| a.file.clone()).collect();
            (composer.text().trim().to_string(), files)
        };
        let config = self.inner.config.load();
        let attachments = files
            .iter()
            .map(|f| crate::types::EncodedAttachment {
                name: f.name().to_string(),
                size: f.size(),
                mime_type: f.mime_type().to_string(),
                last_modified: f.last_modified(),
                base64: String::new(),
            })
            .collect();
        preview_staged_payload(&build_payload(&text, attachments, &config, Utc::now()))
    }

    /// Set the composer text and send.
    pub fn send(&self, text: impl Into<String>) -> Option<DispatchHandle> {
        self.set_text(text);
        self.handle_send()
    }

    /// Submit whatever the composer holds.
    ///
    /// Returns `None` without touching the thread when there is nothing to
    /// send. Must be called from within a tokio runtime.
    pub fn handle_send(&self) -> Option<DispatchHandle> {
        let submission = {
            let mut composer = lock(&self.inner.composer);
            if composer.is_empty() {
                return None;
            }
            composer.take()
        };

        let user = Message::user(&submission.text).with_attachments(attachment_refs(&submission.files));
        let created_at = user.timestamp;
        let placeholder = Message::placeholder();
        let placeholder_id = placeholder.id.clone();

        {
            let mut conversation = lock(&self.inner.conversation);
            conversation.push(user.clone());
            conversation.push(placeholder.clone());
        }

        let observer = &self.inner.observer;
        observer.on_message_appended(&user);
        observer.on_dispatch_start(&placeholder);
        observer.on_status_change(StatusState::Active, LABEL_DISPATCHING);

        info!(
            placeholder_id = placeholder_id.as_str(),
            attachments = submission.files.len(),
            "dispatch submitted"
        );

        let inner = Arc::clone(&self.inner);
        let id = placeholder_id.clone();
        let task = tokio::spawn(async move {
            let result = run_chain(&inner, submission, created_at).await;
            settle(&inner, &id, result)
        });

        Some(DispatchHandle {
            placeholder_id,
            task,
        })
    }
}

async fn run_chain(inner: &Inner, submission: Submission, created_at: DateTime<Utc>) -> Result<Message> {
    let encoded = encode_attachments(&submission.files).await?;
    let config = inner.config.load();
    let payload = build_payload(&submission.text, encoded, &config, created_at);
    debug!(mock = config.uses_mock(), "payload built");
    let raw = inner.transport.dispatch(&payload, &config).await?;
    Ok(normalize(&raw))
}

fn settle(inner: &Inner, placeholder_id: &str, result: Result<Message>) -> Message {
    let (message, label) = match result {
        Ok(message) => (message, inner.config.load().mode_label()),
        Err(e) => {
            warn!(placeholder_id, error = %e, "dispatch failed");
            (Message::error(&e), LABEL_DISPATCH_ERROR)
        }
    };

    let replaced = lock(&inner.conversation).replace(placeholder_id, message.clone());
    if replaced {
        inner.observer.on_dispatch_settled(placeholder_id, &message);
        info!(placeholder_id, is_error = message.is_error, "dispatch settled");
    } else {
        debug!(placeholder_id, "placeholder no longer in the thread, dropping reply");
    }
    inner.observer.on_status_change(StatusState::Idle, label);
    message
}

/// Display refs for a set of staged attachments.
pub fn staged_refs(staged: &[StagedAttachment]) -> Vec<AttachmentRef> {
    staged
        .iter()
        .map(|a| AttachmentRef::new(a.file.name(), a.file.size()))
        .collect()
}
