use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{Backend, Entry, EntryKind};

pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        Ok(Self { root })
    }

    pub fn init(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("failed to create directory: {}", root.display()))?;
        Ok(Self { root })
    }

    /// Absolute on-disk location of a backend-relative path. The empty
    /// prefix and `.` both resolve to the backend root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        if path.is_empty() || path == "." {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path);
        tokio::fs::read(&full)
            .await
            .with_context(|| format!("failed to read: {}", full.display()))
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, data)
            .await
            .with_context(|| format!("failed to write: {}", full.display()))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path);
        Ok(tokio::fs::try_exists(&full).await.unwrap_or(false))
    }

    async fn list(&self, path: &str, with_mime: bool) -> Result<Vec<Entry>> {
        let dir = self.resolve(path);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(&dir).await?;
        while let Some(ent) = read_dir.next_entry().await? {
            let Some(name) = ent.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let rel = if path.is_empty() || path == "." {
                name
            } else {
                format!("{path}/{name}")
            };
            let kind = if ent.file_type().await?.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            let mime_type = match kind {
                EntryKind::File if with_mime => mime_guess::from_path(ent.path())
                    .first_raw()
                    .map(str::to_string),
                _ => None,
            };
            entries.push(Entry {
                path: rel,
                kind,
                mime_type,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
