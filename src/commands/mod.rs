//! Subcommand entry points.
pub mod build;
pub mod install;
pub mod run;
pub mod version;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{CONFIG_FILE, DeployConfig};
use crate::error::DeployError;
use crate::exec::SystemExecutor;
use crate::install::Confirm;
use crate::logging::Logger;
use crate::operations::SystemFileSystemOps;
use crate::orchestrator::{Options, Orchestrator};
use crate::platform::Platform;

/// Environment variable naming the project root when `--root` is absent.
pub const ROOT_ENV: &str = "DEPLOY_ROOT";

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Canonical project root.
    pub root: PathBuf,
    /// Loaded and validated configuration.
    pub config: DeployConfig,
    /// Detected platform.
    pub platform: Platform,
}

impl CommandSetup {
    /// Resolve the project root, detect the platform and load `deploy.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory does not exist or the
    /// configuration fails to load or validate.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let platform = Platform::detect();
        let root = resolve_root(global)?;
        log.debug(&format!("project root: {}", root.display()));

        let config_path = global
            .config
            .clone()
            .unwrap_or_else(|| root.join(CONFIG_FILE));
        log.debug(&format!("config: {}", config_path.display()));
        let config = DeployConfig::load(&config_path).map_err(DeployError::from)?;

        log.info(&format!(
            "{} on {platform}, build dir {}",
            config.project.app_name,
            config.project.build_dir.display()
        ));

        Ok(Self {
            root,
            config,
            platform,
        })
    }

    /// Run the pipeline with production collaborators, then print the summary.
    ///
    /// # Errors
    ///
    /// Returns the pipeline's [`DeployError`] wrapped in [`anyhow::Error`].
    pub fn run_pipeline(&self, options: &Options, confirm: &dyn Confirm, log: &Logger) -> Result<()> {
        let orchestrator = Orchestrator {
            project_root: &self.root,
            config: &self.config,
            platform: self.platform,
            executor: &SystemExecutor,
            fs: &SystemFileSystemOps,
            confirm,
            log,
        };
        let result = orchestrator.run(options);
        log.print_summary();
        result.map_err(anyhow::Error::from)
    }
}

/// Current working directory, used as the default install root.
///
/// # Errors
///
/// Returns an error if the working directory is unavailable.
pub fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("cannot determine the current directory")
}

/// Resolve the project root from `--root`, `DEPLOY_ROOT`, or the current
/// directory, in that order.
///
/// # Errors
///
/// Returns an error if the chosen directory does not exist.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    let root = match (&global.root, std::env::var_os(ROOT_ENV)) {
        (Some(root), _) => root.clone(),
        (None, Some(env_root)) => PathBuf::from(env_root),
        (None, None) => current_dir()?,
    };
    dunce::canonicalize(&root)
        .with_context(|| format!("project root {} does not exist", root.display()))
}
