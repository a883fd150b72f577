//! Presentation-side hooks.
//!
//! The orchestrator reports everything the presentation layer needs to render
//! through [`DispatchObserver`]. Every method has an empty default so front ends
//! implement only what they draw.

use crate::types::Message;
use std::sync::{Arc, PoisonError, RwLock};

/// Coarse activity indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusState {
    Idle,
    Active,
}

pub trait DispatchObserver: Send + Sync {
    /// A message other than a placeholder was appended to the thread.
    fn on_message_appended(&self, _message: &Message) {}

    /// A dispatch began; `placeholder` is already in the thread.
    fn on_dispatch_start(&self, _placeholder: &Message) {}

    /// The placeholder with `placeholder_id` was replaced by `message`.
    fn on_dispatch_settled(&self, _placeholder_id: &str, _message: &Message) {}

    fn on_status_change(&self, _state: StatusState, _label: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {}

pub fn noop_observer() -> Arc<dyn DispatchObserver> {
    Arc::new(NoopObserver)
}

/// Event captured by [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    Appended(Message),
    Started(Message),
    Settled {
        placeholder_id: String,
        message: Message,
    },
    Status {
        state: StatusState,
        label: String,
    },
}

/// In-memory observer for tests and headless use.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: RwLock<Vec<DispatchEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Status transitions in order, as `(state, label)`.
    pub fn statuses(&self) -> Vec<(StatusState, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DispatchEvent::Status { state, label } => Some((state, label)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: DispatchEvent) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl DispatchObserver for RecordingObserver {
    fn on_message_appended(&self, message: &Message) {
        self.record(DispatchEvent::Appended(message.clone()));
    }

    fn on_dispatch_start(&self, placeholder: &Message) {
        self.record(DispatchEvent::Started(placeholder.clone()));
    }

    fn on_dispatch_settled(&self, placeholder_id: &str, message: &Message) {
        self.record(DispatchEvent::Settled {
            placeholder_id: placeholder_id.to_string(),
            message: message.clone(),
        });
    }

    fn on_status_change(&self, state: StatusState, label: &str) {
        self.record(DispatchEvent::Status {
            state,
            label: label.to_string(),
        });
    }
}
