//! # agent-portal
//!
//! 智能体门户客户端运行时：附件编码、请求调度与响应归一化。
//!
//! Chat client runtime for agent backends. A user turn (text plus optional file
//! attachments) is turned into one canonical request, sent to a configurable
//! endpoint or answered locally in mock mode, and whatever comes back is
//! normalized into a single assistant message in the conversation thread.
//!
//! ## Dispatch chain
//!
//! | Step | Module | Description |
//! |------|--------|-------------|
//! | Encode | [`attachments`] | Read staged files concurrently, base64-encode, all-or-nothing |
//! | Build | [`request`] | Assemble the [`Payload`](types::Payload) from input, attachments and configuration |
//! | Transport | [`transport`] | Mock reply or HTTP request with composed URL and headers |
//! | Normalize | [`response`] | Map any reply shape onto an assistant [`Message`] |
//! | Orchestrate | [`dispatch`] | Placeholder lifecycle, error boundary, presentation events |
//!
//! Supporting modules: [`config`] (loading, live swaps, settings validation),
//! [`conversation`] (thread and composer), [`types`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agent_portal::{ConfigLoader, DispatchOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> agent_portal::Result<()> {
//!     let loaded = ConfigLoader::new().with_source("config/app-config.json").load().await;
//!     let portal = DispatchOrchestrator::builder().loaded(loaded).build()?;
//!
//!     if let Some(handle) = portal.send("Summarize the attached report") {
//!         let reply = handle.settled().await;
//!         println!("{}", reply.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod attachments;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod request;
pub mod response;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use attachments::{AttachmentSource, InMemoryFile, LocalFile};
pub use config::{ConfigLoader, Configuration, SettingsUpdate, SharedConfig};
pub use dispatch::{
    DispatchHandle, DispatchObserver, DispatchOrchestrator, OrchestratorBuilder, StatusState,
};
pub use transport::{RawResponse, TransportClient, TransportError};
pub use types::{AttachmentRef, EncodedAttachment, Message, MessageRole, Payload};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
