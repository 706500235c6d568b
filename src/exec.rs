//! Child process execution behind an injectable [`Executor`].
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Result of a command execution.
///
/// Output is not captured: the child inherits the console so build tool
/// progress and the application's own output stream through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecResult {
    /// Whether the process exited with status 0.
    pub success: bool,
    /// Exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ExecResult {
    /// Exit code with signal termination reported as `-1`.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}

impl From<ExitStatus> for ExecResult {
    fn from(status: ExitStatus) -> Self {
        Self {
            success: status.success(),
            code: status.code(),
        }
    }
}

/// Abstraction over launching external programs.
///
/// The pipeline only ever needs a blocking "run this in that directory and
/// tell me how it exited"; everything goes through this trait so tests can
/// substitute scripted exit codes.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run `program` with `args` in `dir`, blocking until it exits.
    ///
    /// A non-zero exit is reported through [`ExecResult`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process could not be started.
    fn run_in(&self, dir: &Path, program: &str, args: &[String]) -> Result<ExecResult>;

    /// Resolve `program` on `PATH`.
    fn which(&self, program: &str) -> Option<PathBuf>;
}

/// Production [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_in(&self, dir: &Path, program: &str, args: &[String]) -> Result<ExecResult> {
        let status = Command::new(program)
            .args(args)
            .current_dir(dir)
            .status()
            .with_context(|| format!("failed to execute: {program} in {}", dir.display()))?;
        Ok(ExecResult::from(status))
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}
