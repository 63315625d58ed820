mod commands;
mod config;
mod progress;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pdfarchiver",
    version,
    about = "Builds directory trees and ships their PDFs to remote storage"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        commands::Command::Init(args) => commands::init::run(args).await,
        commands::Command::Run(args) => commands::run::run(args).await,
        commands::Command::Scan(args) => commands::scan::run(args).await,
    }
}
