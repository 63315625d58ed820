pub mod local;
pub mod s3;

use anyhow::Result;
use async_trait::async_trait;

/// One item returned by a directory listing. `path` is relative to the
/// backend root. `mime_type` is only set for files, and only when the
/// listing asked for mime metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub kind: EntryKind,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn read(&self, path: &str) -> Result<Vec<u8>>;
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;
    async fn exists(&self, path: &str) -> Result<bool>;
    /// List the immediate children of `path`, in a stable order.
    async fn list(&self, path: &str, with_mime: bool) -> Result<Vec<Entry>>;
}
