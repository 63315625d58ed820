use anyhow::{Context, Result};
use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;

use super::{Backend, Entry, EntryKind};

pub struct S3Backend {
    bucket: Box<Bucket>,
    prefix: String,
}

impl S3Backend {
    pub async fn new(
        bucket_name: &str,
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        prefix: Option<&str>,
    ) -> Result<Self> {
        let region = Region::Custom {
            region: region.to_string(),
            endpoint: endpoint.to_string(),
        };
        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)?;
        let bucket = Bucket::new(bucket_name, region, credentials)?.with_path_style();
        let prefix = prefix.unwrap_or("").to_string();
        Ok(Self { bucket, prefix })
    }

    fn full_path(&self, path: &str) -> String {
        if self.prefix.is_empty() {
            path.to_string()
        } else if path.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/{path}", self.prefix)
        }
    }

    fn strip_prefix(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            return key.to_string();
        }
        key.strip_prefix(&format!("{}/", self.prefix))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }
}

#[async_trait]
impl Backend for S3Backend {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.full_path(path);
        let response = self
            .bucket
            .get_object(&full)
            .await
            .with_context(|| format!("S3 GET failed: {full}"))?;
        Ok(response.to_vec())
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full = self.full_path(path);
        self.bucket
            .put_object(&full, data)
            .await
            .with_context(|| format!("S3 PUT failed: {full}"))?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full = self.full_path(path);
        match self.bucket.head_object(&full).await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    async fn list(&self, path: &str, with_mime: bool) -> Result<Vec<Entry>> {
        let full = self.full_path(path);
        // A trailing slash scopes the listing to the immediate children;
        // the delimiter folds deeper keys into common prefixes.
        let query = if full.is_empty() {
            String::new()
        } else {
            format!("{full}/")
        };
        let results = self
            .bucket
            .list(query.clone(), Some("/".to_string()))
            .await
            .with_context(|| format!("S3 LIST failed: {query}"))?;

        let mut entries = Vec::new();
        for result in results {
            for common in result.common_prefixes.unwrap_or_default() {
                entries.push(Entry {
                    path: self.strip_prefix(common.prefix.trim_end_matches('/')),
                    kind: EntryKind::Dir,
                    mime_type: None,
                });
            }
            for obj in result.contents {
                let mime_type = if with_mime {
                    let (head, _) = self
                        .bucket
                        .head_object(&obj.key)
                        .await
                        .with_context(|| format!("S3 HEAD failed: {}", obj.key))?;
                    head.content_type
                } else {
                    None
                };
                entries.push(Entry {
                    path: self.strip_prefix(&obj.key),
                    kind: EntryKind::File,
                    mime_type,
                });
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
