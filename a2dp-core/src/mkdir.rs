//! Directory-creation primitive used before any descriptor copy or install.

use std::io;
use std::path::Path;

use crate::runner::{CommandRunner, Invocation};

/// How missing target directories get created.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MkdirPrimitive {
    /// `std::fs::create_dir_all`.
    #[default]
    Native,
    /// An external command that receives the directory as its last argument,
    /// e.g. `install -d -m 0755` or `sudo mkdir -p`.
    Command { program: String, args: Vec<String> },
}

impl MkdirPrimitive {
    /// An empty command selects [`MkdirPrimitive::Native`].
    pub fn from_command(command: &[String]) -> Self {
        match command.split_first() {
            None => MkdirPrimitive::Native,
            Some((program, args)) => MkdirPrimitive::Command {
                program: program.clone(),
                args: args.to_vec(),
            },
        }
    }

    /// Make sure `dir` exists. A directory that is already there is left alone.
    pub fn ensure_dir(&self, dir: &Path, runner: &dyn CommandRunner) -> io::Result<()> {
        if dir.is_dir() {
            return Ok(());
        }
        match self {
            MkdirPrimitive::Native => std::fs::create_dir_all(dir),
            MkdirPrimitive::Command { program, args } => {
                let invocation = Invocation::new(program.as_str())
                    .args(args.iter().cloned())
                    .arg(dir.display().to_string());
                let output = runner.run(&invocation)?;
                if output.success() {
                    tracing::debug!("created {}", dir.display());
                    Ok(())
                } else {
                    Err(io::Error::other(format!(
                        "`{}` failed: {}",
                        invocation.command_line(),
                        output.failure_detail()
                    )))
                }
            }
        }
    }
}
