//! Domain-specific error types for the deploy pipeline.
//!
//! Internal modules return typed errors (e.g., [`BuildError`],
//! [`InstallError`]) while the CLI boundary carries them inside
//! [`anyhow::Error`] and recovers the exit code with [`exit_code_for`].
//!
//! # Error hierarchy
//!
//! ```text
//! DeployError
//! ├── Config(ConfigError)    deploy.toml loading and validation
//! ├── Build(BuildError)      preflight, scratch dir, configure/build steps
//! ├── Run(RunError)          launching the freshly built executable
//! ├── Resolve(ResolveError)  required artifacts or assets missing
//! └── Install(InstallError)  target checks, copy failures, rollback
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code categories reported to calling automation.
pub mod exit {
    /// Configuration or any uncategorised failure.
    pub const GENERAL: u8 = 1;
    /// The external build tool failed or could not be started.
    pub const BUILD_FAILED: u8 = 3;
    /// The built executable exited non-zero or could not be started.
    pub const RUN_FAILED: u8 = 4;
    /// The install target root does not exist.
    pub const PATH_NOT_FOUND: u8 = 5;
    /// The user declined to overwrite or to use the default target.
    pub const DECLINED: u8 = 6;
    /// A required artifact or the asset directory is missing.
    pub const ARTIFACT_MISSING: u8 = 7;
    /// Copying into the install directory failed (after rollback).
    pub const COPY_FAILED: u8 = 8;
}

/// Top-level error type for the deploy pipeline.
#[derive(Error, Debug)]
pub enum DeployError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Build step failure.
    #[error("build failed: {0}")]
    Build(#[from] BuildError),

    /// Executable run failure.
    #[error("run failed: {0}")]
    Run(#[from] RunError),

    /// Install plan could not be resolved.
    #[error("cannot resolve install plan: {0}")]
    Resolve(#[from] ResolveError),

    /// Install transaction failure.
    #[error("install failed: {0}")]
    Install(#[from] InstallError),
}

impl DeployError {
    /// Process exit code for this failure category.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => exit::GENERAL,
            Self::Build(_) => exit::BUILD_FAILED,
            Self::Run(_) => exit::RUN_FAILED,
            Self::Resolve(_) => exit::ARTIFACT_MISSING,
            Self::Install(e) => e.exit_code(),
        }
    }
}

/// Find the exit code for an error that crossed the `anyhow` boundary.
///
/// Walks the cause chain looking for a [`DeployError`]; anything else maps
/// to [`exit::GENERAL`].
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<DeployError>())
        .map_or(exit::GENERAL, DeployError::exit_code)
}

/// Render an error and its causes on one line.
///
/// Typed errors here already embed their source in their own message, so a
/// cause whose text is already part of the line is not repeated.
#[must_use]
pub fn display_chain(err: &anyhow::Error) -> String {
    let mut line = String::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if line.contains(&text) {
            continue;
        }
        if !line.is_empty() {
            line.push_str(": ");
        }
        line.push_str(&text);
    }
    line
}

/// Errors that arise from loading `deploy.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The config file is not valid TOML or has the wrong shape.
    #[error("invalid TOML in {path}: {message}")]
    Parse {
        /// Path to the config file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The config parsed but violates a semantic rule.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The two ordered build tool invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    /// `cmake <source>` in the output directory.
    Configure,
    /// `cmake --build .`.
    Compile,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configure => write!(f, "configure"),
            Self::Compile => write!(f, "build"),
        }
    }
}

/// Errors from the build invoker.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The build program is not on `PATH`.
    #[error("'{program}' not found on PATH")]
    ToolNotFound {
        /// Program that was looked up.
        program: String,
    },

    /// The scratch build directory could not be reset.
    #[error("cannot reset build directory {path}: {source}")]
    Scratch {
        /// Build output directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The build program could not be started.
    #[error("cannot start {step} step: {source}")]
    Spawn {
        /// Step being started.
        step: BuildStep,
        /// Underlying error from the executor.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A step exited non-zero.
    #[error("{step} step exited with code {exit_code}")]
    Failed {
        /// Step that failed.
        step: BuildStep,
        /// Exit code reported by the tool (`-1` when killed by a signal).
        exit_code: i32,
    },
}

/// Errors from running the built executable.
#[derive(Error, Debug)]
pub enum RunError {
    /// The executable is not where the build should have put it.
    #[error("executable not found at {0}")]
    NotFound(PathBuf),

    /// The executable could not be started.
    #[error("cannot start {path}: {source}")]
    Spawn {
        /// Executable path.
        path: PathBuf,
        /// Underlying error from the executor.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The executable exited non-zero.
    #[error("{path} exited with code {exit_code}")]
    Failed {
        /// Executable path.
        path: PathBuf,
        /// Exit code (`-1` when killed by a signal).
        exit_code: i32,
    },
}

/// Errors from the dependency resolver.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A required artifact is absent at every candidate location.
    #[error("required artifact '{artifact}' not found (searched: {})", display_paths(.searched))]
    ArtifactMissing {
        /// Install-side name of the artifact.
        artifact: String,
        /// Every location that was checked.
        searched: Vec<PathBuf>,
    },

    /// The asset source directory does not exist.
    #[error("asset directory not found: {0}")]
    AssetsMissing(PathBuf),
}

/// Errors from the install transaction.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The target root does not exist.
    #[error("target path does not exist: {0}")]
    PathNotFound(PathBuf),

    /// The destination exists and overwrite was declined.
    #[error("{0} already exists and overwrite was declined")]
    OverwriteDeclined(PathBuf),

    /// No target path was given and the current-directory default was declined.
    #[error("no install path given and installing to {0} was declined")]
    TargetDeclined(PathBuf),

    /// An artifact or asset could not be copied. The destination was rolled back.
    #[error("copying {artifact} from {from} to {to}: {source}")]
    CopyFailed {
        /// Artifact (or asset directory) being copied.
        artifact: String,
        /// Source path.
        from: PathBuf,
        /// Destination path.
        to: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Preparing the destination directory (removal or creation) failed.
    #[error("cannot prepare {path}: {source}")]
    Prepare {
        /// Destination directory.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A failure occurred and the rollback could not remove the destination.
    #[error("{cause}; rollback of {path} also failed: {source}")]
    RollbackFailed {
        /// Destination that may be left behind.
        path: PathBuf,
        /// Error from removing the destination.
        source: io::Error,
        /// The failure that triggered the rollback.
        cause: Box<Self>,
    },
}

impl InstallError {
    /// Process exit code for this failure category.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::PathNotFound(_) => exit::PATH_NOT_FOUND,
            Self::OverwriteDeclined(_) | Self::TargetDeclined(_) => exit::DECLINED,
            Self::CopyFailed { .. } | Self::Prepare { .. } => exit::COPY_FAILED,
            Self::RollbackFailed { cause, .. } => cause.exit_code(),
        }
    }
}

/// An optional artifact that was absent and dropped from the plan.
///
/// Never fatal: some build configurations link statically what others load
/// dynamically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalArtifactMissing {
    /// Install-side name of the artifact.
    pub artifact: String,
    /// Location that was checked.
    pub path: PathBuf,
}

impl fmt::Display for OptionalArtifactMissing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "optional artifact '{}' not found at {}, skipping",
            self.artifact,
            self.path.display()
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
