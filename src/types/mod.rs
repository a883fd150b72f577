//! 类型系统模块：对话消息与请求负载的核心数据类型。
//!
//! # Types Module
//!
//! Strongly-typed representations of what flows through one dispatch:
//! thread messages on the presentation side, payloads on the wire side.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Thread entry with role, content and optional attachment refs |
//! | [`MessageRole`] | Message role (user, assistant, system) |
//! | [`AttachmentRef`] | Lightweight `{name, size}` shown next to a user message |
//! | [`EncodedAttachment`] | Transport form of a file, base64 body included |
//! | [`Payload`] | Canonical request body sent to the backend |
//!
//! ## Example
//!
//! ```rust
//! use agent_portal::types::{Message, MessageRole};
//!
//! let system = Message::system("You are a helpful assistant");
//! let placeholder = Message::placeholder();
//!
//! assert!(matches!(system.role, MessageRole::System));
//! assert!(placeholder.loading);
//! ```

pub mod message;
pub mod payload;

pub use message::{AttachmentRef, Message, MessageRole};
pub use payload::{EncodedAttachment, Payload};
