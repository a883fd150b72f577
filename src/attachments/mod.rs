//! 附件编码：读取暂存文件并转换为可嵌入 JSON 的 base64 形式。
//!
//! Attachment encoding.
//!
//! Turns staged [`AttachmentSource`] handles into [`EncodedAttachment`]s.
//! All reads run concurrently; the batch is all-or-nothing, so one unreadable
//! file fails the whole dispatch before anything goes on the wire.

pub mod source;

pub use source::{AttachmentSource, InMemoryFile, LocalFile};

use crate::types::{AttachmentRef, EncodedAttachment};
use crate::{Error, Result};
use base64::Engine as _;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::debug;

/// Shared handle to a staged file.
pub type StagedFile = Arc<dyn AttachmentSource>;

/// Upper bound on reads in flight for one batch.
const MAX_CONCURRENT_READS: usize = 8;

/// Encode every source, preserving input order.
pub async fn encode_attachments(sources: &[StagedFile]) -> Result<Vec<EncodedAttachment>> {
    if sources.is_empty() {
        return Ok(Vec::new());
    }

    // `buffered` keeps input order; the first failed read ends the batch.
    let reads: Vec<_> = sources.iter().map(|s| encode_one(s.as_ref())).collect();
    let encoded: Vec<EncodedAttachment> = stream::iter(reads)
        .buffered(MAX_CONCURRENT_READS)
        .try_collect()
        .await?;
    debug!(count = encoded.len(), "attachments encoded");
    Ok(encoded)
}

async fn encode_one(source: &dyn AttachmentSource) -> Result<EncodedAttachment> {
    let bytes = source
        .read_bytes()
        .await
        .map_err(|e| Error::attachment_read(source.name(), e))?;

    Ok(EncodedAttachment {
        name: source.name().to_string(),
        size: bytes.len() as u64,
        mime_type: source.mime_type().to_string(),
        last_modified: source.last_modified(),
        base64: base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

/// Display refs for the user message that carries these sources.
pub fn attachment_refs(sources: &[StagedFile]) -> Vec<AttachmentRef> {
    sources
        .iter()
        .map(|s| AttachmentRef::new(s.name(), s.size()))
        .collect()
}
