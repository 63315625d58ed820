pub mod init;
pub mod run;
pub mod scan;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Command {
    /// Write the archiver configuration
    Init(init::InitArgs),
    /// Build trigger directories and upload their PDFs
    Run(run::RunArgs),
    /// List the directories a run would trigger on
    Scan(scan::ScanArgs),
}
