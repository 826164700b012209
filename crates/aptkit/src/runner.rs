//! Process execution seam.
//!
//! Every apt/dpkg invocation goes through a [`CommandRunner`] so the
//! backend can be driven by a scripted runner in tests.

use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::process::{Command, Output, Stdio};

/// Captured result of one command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// Whether the process exited with status zero
    pub success: bool,
}

impl CommandOutput {
    /// A successful run with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            success: true,
        }
    }

    /// A failed run with the given stderr.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            success: false,
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        }
    }
}

/// Runs an external program to completion.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`.
    ///
    /// A nonzero exit is reported through [`CommandOutput::success`];
    /// `Err` means the program could not be started.
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// Runner that spawns real processes, non-interactively.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        log::debug!("Running: {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => Error::AptNotFound,
                _ => Error::Spawn {
                    program: program.to_string(),
                    source,
                },
            })?;

        Ok(output.into())
    }
}
