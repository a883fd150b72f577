//! Conversation thread and composer staging area.

use crate::attachments::StagedFile;
use crate::types::{message::new_id, Message, MessageRole};

/// Ordered, in-memory conversation thread.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// A thread seeded with the system prompt, when there is one.
    pub fn new(system_prompt: &str) -> Self {
        let mut conversation = Self::default();
        conversation.seed(system_prompt);
        conversation
    }

    fn seed(&mut self, system_prompt: &str) {
        let prompt = system_prompt.trim();
        if !prompt.is_empty() {
            self.messages.push(Message::system(prompt));
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Number of placeholders still waiting for their dispatch to settle.
    pub fn pending_count(&self) -> usize {
        self.messages.iter().filter(|m| m.loading).count()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace the entry with `id` in place. Returns `false` when it is gone.
    pub fn replace(&mut self, id: &str, message: Message) -> bool {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(slot) => {
                *slot = message;
                true
            }
            None => false,
        }
    }

    /// Drop every message and re-seed with the system prompt.
    pub fn clear(&mut self, system_prompt: &str) {
        self.messages.clear();
        self.seed(system_prompt);
    }

    /// Keep the leading system message in line with an edited prompt.
    pub fn sync_system_prompt(&mut self, system_prompt: &str) {
        let prompt = system_prompt.trim();
        let leading_system = self
            .messages
            .first()
            .map(|m| m.role == MessageRole::System)
            .unwrap_or(false);

        match (leading_system, prompt.is_empty()) {
            (true, false) => self.messages[0].content = prompt.to_string(),
            (true, true) => {
                self.messages.remove(0);
            }
            (false, false) => self.messages.insert(0, Message::system(prompt)),
            (false, true) => {}
        }
    }
}

/// A file staged for the next message.
#[derive(Clone)]
pub struct StagedAttachment {
    pub id: String,
    pub file: StagedFile,
}

impl std::fmt::Debug for StagedAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedAttachment")
            .field("id", &self.id)
            .field("name", &self.file.name())
            .field("size", &self.file.size())
            .finish()
    }
}

/// What the composer held at the moment of sending.
#[derive(Clone)]
pub struct Submission {
    pub text: String,
    pub files: Vec<StagedFile>,
}

impl std::fmt::Debug for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.files.iter().map(|file| file.name()).collect();
        f.debug_struct("Submission")
            .field("text", &self.text)
            .field("files", &names)
            .finish()
    }
}

/// Input text plus staged attachments awaiting the next send.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    text: String,
    staged: Vec<StagedAttachment>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Stage a file and return its staging id.
    pub fn stage(&mut self, file: StagedFile) -> String {
        let id = new_id();
        self.staged.push(StagedAttachment {
            id: id.clone(),
            file,
        });
        id
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.staged.len();
        self.staged.retain(|a| a.id != id);
        self.staged.len() != before
    }

    pub fn staged(&self) -> &[StagedAttachment] {
        &self.staged
    }

    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// Nothing to send: blank text and no attachments.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.staged.is_empty()
    }

    /// Snapshot and clear. Text is trimmed.
    pub fn take(&mut self) -> Submission {
        let text = std::mem::take(&mut self.text).trim().to_string();
        let files = std::mem::take(&mut self.staged)
            .into_iter()
            .map(|a| a.file)
            .collect();
        Submission { text, files }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::InMemoryFile;
    use std::sync::Arc;

    #[test]
    fn test_seed_and_clear() {
        let mut c = Conversation::new("  be brief ");
        assert_eq!(c.message_count(), 1);
        assert_eq!(c.messages()[0].content, "be brief");

        c.push(Message::user("hi"));
        c.clear("be brief");
        assert_eq!(c.message_count(), 1);

        assert_eq!(Conversation::new("").message_count(), 0);
    }

    #[test]
    fn test_replace_by_id() {
        let mut c = Conversation::new("");
        let placeholder = Message::placeholder();
        let id = placeholder.id.clone();
        c.push(Message::user("q"));
        c.push(placeholder);
        assert_eq!(c.pending_count(), 1);

        assert!(c.replace(&id, Message::assistant("a")));
        assert_eq!(c.messages()[1].content, "a");
        assert_eq!(c.pending_count(), 0);
        assert!(!c.replace(&id, Message::assistant("again")));
    }

    #[test]
    fn test_sync_system_prompt() {
        let mut c = Conversation::new("old");
        c.push(Message::user("q"));

        c.sync_system_prompt("new");
        assert_eq!(c.messages()[0].content, "new");
        assert_eq!(c.message_count(), 2);

        c.sync_system_prompt("  ");
        assert_eq!(c.message_count(), 1);
        assert_eq!(c.messages()[0].role, MessageRole::User);

        c.sync_system_prompt("back");
        assert_eq!(c.messages()[0].role, MessageRole::System);
        assert_eq!(c.message_count(), 2);
    }

    #[test]
    fn test_composer_staging() {
        let mut composer = Composer::new();
        assert!(composer.is_empty());
        composer.set_text("   ");
        assert!(composer.is_empty());

        let a = composer.stage(Arc::new(InMemoryFile::new("a.txt", b"a".to_vec())));
        let b = composer.stage(Arc::new(InMemoryFile::new("b.txt", b"b".to_vec())));
        assert!(!composer.is_empty());
        assert!(composer.remove(&a));
        assert!(!composer.remove(&a));
        assert_eq!(composer.staged_count(), 1);
        assert_eq!(composer.staged()[0].id, b);

        composer.set_text(" hello ");
        let submission = composer.take();
        assert_eq!(submission.text, "hello");
        assert_eq!(submission.files.len(), 1);
        assert!(composer.is_empty());
        assert_eq!(composer.text(), "");
    }
}
