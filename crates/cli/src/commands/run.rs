use anyhow::Result;
use clap::Args;

use pdfarchiver_core::{Archiver, DirPath};

use crate::config::AppConfig;

#[derive(Args)]
pub struct RunArgs {
    /// Directory to start from, relative to the archive root
    #[arg(long, default_value = ".")]
    start: String,

    /// Emit the run report as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let config = AppConfig::load()?;
    let local = config.open_local()?;
    let remote = config.open_remote().await?;

    let archiver = Archiver::new(local, remote)
        .with_build(config.build_command())
        .with_build_file(&config.build.build_file);

    let report = archiver.run_from(DirPath::parse(&args.start)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!();
    println!("Directories visited: {}", report.directories_visited);
    println!("Trigger directories: {}", report.trigger_directories);
    println!("Files uploaded:      {}", report.files_uploaded);
    println!("Bytes uploaded:      {}", format_bytes(report.bytes_uploaded));
    if report.failed_builds > 0 {
        println!("Failed builds:       {}", report.failed_builds);
    }
    println!("Duration:            {:.1}s", report.duration_secs);

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
