use anyhow::Result;
use clap::Args;
use tracing::info;

use pdfarchiver_core::backend::local::LocalBackend;

use crate::config::{AppConfig, ArchiveConfig, BuildConfig, RemoteConfig};

#[derive(Args)]
pub struct InitArgs {
    /// Root of the local directory tree to archive
    #[arg(long)]
    root: String,

    /// Remote type: local or s3
    #[arg(long)]
    remote: String,

    /// Path for a local remote
    #[arg(long)]
    path: Option<String>,

    /// S3 endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// S3 bucket name
    #[arg(long)]
    bucket: Option<String>,

    /// S3 region
    #[arg(long, default_value = "auto")]
    region: String,

    /// S3 access key
    #[arg(long)]
    access_key: Option<String>,

    /// S3 secret key
    #[arg(long)]
    secret_key: Option<String>,

    /// S3 path prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Command run in each trigger directory
    #[arg(long, default_value = "make")]
    build_command: String,

    /// File that marks a directory as buildable
    #[arg(long, default_value = "Makefile")]
    build_file: String,
}

pub async fn run(args: InitArgs) -> Result<()> {
    if !std::path::Path::new(&args.root).is_dir() {
        anyhow::bail!("archive root is not a directory: {}", args.root);
    }

    let remote = match args.remote.as_str() {
        "local" => {
            let path = args
                .path
                .ok_or_else(|| anyhow::anyhow!("--path required for local remote"))?;
            // Created up front so the first run has somewhere to write.
            LocalBackend::init(&path)?;
            RemoteConfig::Local { path }
        }
        "s3" => {
            let endpoint = args
                .endpoint
                .ok_or_else(|| anyhow::anyhow!("--endpoint required for S3 remote"))?;
            let bucket = args
                .bucket
                .ok_or_else(|| anyhow::anyhow!("--bucket required for S3 remote"))?;
            let access_key = args
                .access_key
                .ok_or_else(|| anyhow::anyhow!("--access-key required for S3 remote"))?;
            let secret_key = args
                .secret_key
                .ok_or_else(|| anyhow::anyhow!("--secret-key required for S3 remote"))?;
            RemoteConfig::S3 {
                endpoint,
                region: args.region,
                bucket,
                access_key,
                secret_key,
                prefix: args.prefix,
            }
        }
        other => anyhow::bail!("unknown remote: {other} (supported: local, s3)"),
    };

    let config = AppConfig {
        archive: ArchiveConfig { root: args.root },
        remote,
        build: BuildConfig {
            command: args.build_command,
            args: Vec::new(),
            build_file: args.build_file,
        },
    };
    config.save()?;

    info!(
        config_path = %AppConfig::config_path().display(),
        "Configuration saved."
    );
    println!("Configuration saved.");
    println!("Config: {}", AppConfig::config_path().display());
    Ok(())
}
