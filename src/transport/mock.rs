//! Offline responder used in mock mode.

use crate::types::Payload;
use std::time::Duration;

/// Simulated latency so the UI behaves as it would against a real backend.
pub const DEFAULT_MOCK_DELAY: Duration = Duration::from_millis(700);

/// Above this temperature the mock reply claims a creative working mode.
pub const CREATIVE_THRESHOLD: f64 = 0.6;

/// Deterministic reply describing what the backend would have received.
pub fn mock_reply(payload: &Payload) -> String {
    let attachment_note = match payload.attachments.len() {
        0 => "No additional material was attached to this request.".to_string(),
        1 => "I received 1 attachment and can use it in the analysis.".to_string(),
        n => format!("I received {} attachments and can use them in the analysis.", n),
    };

    let mode = if payload.temperature > CREATIVE_THRESHOLD {
        "creative"
    } else {
        "rigorous"
    };

    format!(
        "Instruction received:\n{}\n\n{}\nCurrent working mode: {}.",
        payload.input, attachment_note, mode
    )
}
