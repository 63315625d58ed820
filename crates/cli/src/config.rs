use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use pdfarchiver_core::backend::Backend;
use pdfarchiver_core::backend::local::LocalBackend;
use pdfarchiver_core::backend::s3::S3Backend;
use pdfarchiver_core::build::BuildCommand;

const CONFIG_FILE: &str = "pdfarchiver.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub archive: ArchiveConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Root of the local tree that gets scanned.
    pub root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RemoteConfig {
    #[serde(rename = "local")]
    Local { path: String },
    #[serde(rename = "s3")]
    S3 {
        endpoint: String,
        region: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        prefix: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Command run in each trigger directory.
    #[serde(default = "default_build_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// File that marks a directory as buildable.
    #[serde(default = "default_build_file")]
    pub build_file: String,
}

fn default_build_command() -> String {
    "make".to_string()
}

fn default_build_file() -> String {
    "Makefile".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: default_build_command(),
            args: Vec::new(),
            build_file: default_build_file(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pdfarchiver")
            .join(CONFIG_FILE)
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("config not found at {}", path.display()))?;
        toml::from_str(&content).context("failed to parse config")
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    pub fn open_local(&self) -> Result<Arc<LocalBackend>> {
        Ok(Arc::new(LocalBackend::new(&self.archive.root)?))
    }

    pub async fn open_remote(&self) -> Result<Arc<dyn Backend>> {
        match &self.remote {
            RemoteConfig::Local { path } => Ok(Arc::new(LocalBackend::init(path)?)),
            RemoteConfig::S3 {
                endpoint,
                region,
                bucket,
                access_key,
                secret_key,
                prefix,
            } => {
                let backend = S3Backend::new(
                    bucket,
                    endpoint,
                    region,
                    access_key,
                    secret_key,
                    prefix.as_deref(),
                )
                .await?;
                Ok(Arc::new(backend))
            }
        }
    }

    pub fn build_command(&self) -> BuildCommand {
        BuildCommand::new(&self.build.command).with_args(self.build.args.iter().cloned())
    }
}
