use anyhow::Result;
use clap::Args;
use serde::Serialize;

use pdfarchiver_core::{Archiver, DirPath};

use crate::config::AppConfig;
use crate::progress;

#[derive(Args)]
pub struct ScanArgs {
    /// Directory to start from, relative to the archive root
    #[arg(long, default_value = ".")]
    start: String,

    /// Emit the trigger directories as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct ScanOutput {
    directories: Vec<String>,
}

pub async fn run(args: ScanArgs) -> Result<()> {
    let config = AppConfig::load()?;
    let local = config.open_local()?;
    let remote = config.open_remote().await?;

    let archiver = Archiver::new(local, remote).with_build_file(&config.build.build_file);

    if args.json {
        let triggers = archiver.scan_from(DirPath::parse(&args.start)).await?;
        let output = ScanOutput {
            directories: triggers.iter().map(|d| d.to_string()).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let spinner = progress::create_spinner("Scanning for trigger directories...");
    let triggers = archiver.scan_from(DirPath::parse(&args.start)).await?;
    spinner.finish_with_message(format!("Found {} trigger directories", triggers.len()));

    if triggers.is_empty() {
        println!("No trigger directories found.");
        return Ok(());
    }
    for dir in &triggers {
        println!("  {dir}");
    }

    Ok(())
}
