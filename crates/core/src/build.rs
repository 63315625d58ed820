use std::path::Path;

use tokio::process::Command;
use tracing::{debug, warn};

/// External build step launched inside a trigger directory. The archiver
/// treats the build as best-effort: the outcome is recorded and logged but
/// never aborts a run.
#[derive(Debug, Clone)]
pub struct BuildCommand {
    program: String,
    args: Vec<String>,
}

impl BuildCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args = args.into_iter().collect();
        self
    }

    /// Run the command with `workdir` as its working directory and wait for
    /// it to exit. Stdout and stderr are inherited from the caller.
    pub async fn run_in(&self, workdir: &Path) -> BuildOutcome {
        debug!(program = %self.program, workdir = %workdir.display(), "running build command");
        match Command::new(&self.program)
            .args(&self.args)
            .current_dir(workdir)
            .status()
            .await
        {
            Ok(status) => BuildOutcome {
                launched: true,
                exit_code: status.code(),
            },
            Err(err) => {
                warn!(program = %self.program, error = %err, "build command failed to launch");
                BuildOutcome {
                    launched: false,
                    exit_code: None,
                }
            }
        }
    }
}

impl Default for BuildCommand {
    fn default() -> Self {
        Self::new("make")
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BuildOutcome {
    pub launched: bool,
    pub exit_code: Option<i32>,
}

impl BuildOutcome {
    pub fn succeeded(&self) -> bool {
        self.launched && self.exit_code == Some(0)
    }
}
