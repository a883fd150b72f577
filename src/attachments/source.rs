//! File handles that can be staged in the composer.

use crate::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

const DEFAULT_MIME: &str = "application/octet-stream";

/// A raw file handle as the presentation layer hands it over.
///
/// Metadata is captured when the handle is created; only the body is read
/// lazily, at dispatch time.
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    fn name(&self) -> &str;

    fn size(&self) -> u64;

    fn mime_type(&self) -> &str;

    /// Modification time in milliseconds since the Unix epoch, when known.
    fn last_modified(&self) -> Option<i64>;

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>>;
}

/// A file on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    size: u64,
    mime_type: String,
    last_modified: Option<i64>,
}

impl LocalFile {
    /// Stat the file and capture its metadata.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());

        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Error::attachment_read(&name, e))?;
        if !meta.is_file() {
            return Err(Error::attachment_read(&name, "not a regular file"));
        }

        let last_modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64);

        Ok(Self {
            mime_type: guess_media_type(&path)
                .unwrap_or(DEFAULT_MIME)
                .to_string(),
            path,
            name,
            size: meta.len(),
            last_modified,
        })
    }
}

#[async_trait]
impl AttachmentSource for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn last_modified(&self) -> Option<i64> {
        self.last_modified
    }

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

/// A file whose body is already in memory (uploads, pasted content, tests).
#[derive(Debug, Clone)]
pub struct InMemoryFile {
    name: String,
    mime_type: String,
    last_modified: Option<i64>,
    bytes: Vec<u8>,
}

impl InMemoryFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        Self {
            mime_type: guess_media_type(Path::new(&name))
                .unwrap_or(DEFAULT_MIME)
                .to_string(),
            name,
            last_modified: Some(chrono::Utc::now().timestamp_millis()),
            bytes: bytes.into(),
        }
    }

    pub fn with_last_modified(mut self, millis: Option<i64>) -> Self {
        self.last_modified = millis;
        self
    }
}

#[async_trait]
impl AttachmentSource for InMemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    fn last_modified(&self) -> Option<i64> {
        self.last_modified
    }

    async fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

fn guess_media_type(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    let mt = match ext.as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "csv" => "text/csv",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => return None,
    };
    Some(mt)
}
