//! Pipeline sequencing: build, then optionally run or install.
//!
//! The build always comes first; a failed build ends the pipeline before
//! anything is run or packaged. Each step is recorded through
//! [`Log::record_step`] so the caller can print a summary.
use std::path::{Path, PathBuf};

use crate::builder::BuildInvoker;
use crate::config::{ArtifactKind, DeployConfig, TargetDefault};
use crate::error::{DeployError, InstallError, RunError};
use crate::exec::Executor;
use crate::install::{Confirm, InstallTarget, InstallTransaction};
use crate::logging::{Log, StepStatus};
use crate::operations::FileSystemOps;
use crate::platform::Platform;
use crate::resolver::DependencyResolver;

/// What to do after a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Stop after building.
    BuildOnly,
    /// Launch the freshly built executable from the build directory.
    BuildAndRun,
    /// Resolve the install plan and install it.
    BuildAndInstall,
}

/// Per-invocation options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Pipeline mode.
    pub mode: Mode,
    /// Install root given on the command line.
    pub install_root: Option<PathBuf>,
    /// Directory used when no install root is given.
    pub cwd: PathBuf,
    /// Log install mutations instead of performing them.
    pub dry_run: bool,
}

impl Options {
    /// Options for `mode` with no install root, rooted at `cwd`.
    #[must_use]
    pub fn new(mode: Mode, cwd: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            install_root: None,
            cwd: cwd.into(),
            dry_run: false,
        }
    }
}

/// Collaborators the pipeline runs against.
pub struct Orchestrator<'a> {
    /// Project source root (holds `CMakeLists.txt` and the assets).
    pub project_root: &'a Path,
    /// Loaded configuration.
    pub config: &'a DeployConfig,
    /// Platform whose artifact layout applies.
    pub platform: Platform,
    /// Launches the build tool and the built executable.
    pub executor: &'a dyn Executor,
    /// Filesystem used for resolution and installation.
    pub fs: &'a dyn FileSystemOps,
    /// Answers both the default-target question (asked before the build) and
    /// the overwrite question (asked by the install transaction).
    pub confirm: &'a dyn Confirm,
    /// Progress output and step summary.
    pub log: &'a dyn Log,
}

impl std::fmt::Debug for Orchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("project_root", &self.project_root)
            .field("platform", &self.platform)
            .field("executor", &self.executor)
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

impl Orchestrator<'_> {
    /// Absolute build output directory.
    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.project_root.join(&self.config.project.build_dir)
    }

    /// Run the pipeline for `options.mode`.
    ///
    /// The install root is settled before anything is built, so declining
    /// the default target costs no build. Every mode records the same four
    /// steps; the ones the mode does not use are marked skipped.
    ///
    /// # Errors
    ///
    /// Returns the first failure; [`DeployError::exit_code`] gives its
    /// category.
    pub fn run(&self, options: &Options) -> Result<(), DeployError> {
        let install_root = match options.mode {
            Mode::BuildAndInstall => Some(self.target_root(options).map_err(|e| {
                let e = DeployError::from(e);
                self.log
                    .record_step("Install", StepStatus::Failed, Some(&e.to_string()));
                e
            })?),
            Mode::BuildOnly | Mode::BuildAndRun => None,
        };

        self.log.stage("Build");
        self.step("Build", StepStatus::Ok, || self.build())?;

        if options.mode == Mode::BuildAndRun {
            self.log.stage("Run");
            self.step("Run", StepStatus::Ok, || self.run_executable())?;
        } else {
            self.log.record_step("Run", StepStatus::Skipped, None);
        }

        let Some(root) = install_root else {
            self.log.record_step("Resolve", StepStatus::Skipped, None);
            self.log.record_step("Install", StepStatus::Skipped, None);
            return Ok(());
        };

        self.log.stage("Install");
        let plan = self.step("Resolve", StepStatus::Ok, || {
            DependencyResolver::new(self.config, self.project_root, self.fs)
                .resolve(self.platform, &self.build_dir(), self.log)
                .map_err(DeployError::from)
        })?;
        let done = if options.dry_run {
            StepStatus::DryRun
        } else {
            StepStatus::Ok
        };
        self.step("Install", done, || {
            let target = InstallTarget::new(root, self.config.project.app_name.clone());
            InstallTransaction::new(self.fs, self.confirm, self.log)
                .dry_run(options.dry_run)
                .install(&plan, &target)
                .map_err(DeployError::from)
        })?;
        Ok(())
    }

    /// Run `f` and record its outcome under `name`.
    fn step<T>(
        &self,
        name: &str,
        done: StepStatus,
        f: impl FnOnce() -> Result<T, DeployError>,
    ) -> Result<T, DeployError> {
        let result = f();
        match &result {
            Ok(_) => self.log.record_step(name, done, None),
            Err(e) => self
                .log
                .record_step(name, StepStatus::Failed, Some(&e.to_string())),
        }
        result
    }

    fn build(&self) -> Result<(), DeployError> {
        let build_dir = self.build_dir();
        let result = BuildInvoker::new(
            self.project_root,
            &build_dir,
            &self.config.build,
            self.platform,
            self.executor,
        )
        .build_type(self.config.project.build_type.as_deref())
        .build(self.log)?;
        result.into_result()?;
        Ok(())
    }

    /// Launch the built executable from the build directory and wait for it.
    fn run_executable(&self) -> Result<(), DeployError> {
        let build_dir = self.build_dir();
        let candidates: Vec<PathBuf> = self
            .config
            .artifacts_for(self.platform)
            .iter()
            .filter(|s| s.kind == ArtifactKind::Executable)
            .flat_map(|s| s.candidates(&build_dir))
            .collect();
        let exe = candidates
            .iter()
            .find(|p| self.fs.is_file(p))
            .ok_or_else(|| {
                RunError::NotFound(candidates.first().cloned().unwrap_or_else(|| build_dir.clone()))
            })?;

        let program = exe.display().to_string();
        self.log.info(&format!("running {program}"));
        let result = self
            .executor
            .run_in(&build_dir, &program, &[])
            .map_err(|e| RunError::Spawn {
                path: exe.clone(),
                source: e.into(),
            })?;
        if !result.success {
            return Err(RunError::Failed {
                path: exe.clone(),
                exit_code: result.exit_code(),
            }
            .into());
        }
        Ok(())
    }

    /// Install root from the command line, or the configured default.
    fn target_root(&self, options: &Options) -> Result<PathBuf, InstallError> {
        if let Some(root) = &options.install_root {
            return Ok(root.clone());
        }
        match self.config.install.target_default {
            TargetDefault::Cwd => Ok(options.cwd.clone()),
            TargetDefault::Prompt => {
                let question = format!(
                    "Install to current directory ({})?",
                    options.cwd.display()
                );
                if self.confirm.confirm(&question) {
                    Ok(options.cwd.clone())
                } else {
                    Err(InstallError::TargetDeclined(options.cwd.clone()))
                }
            }
            TargetDefault::Require => {
                self.log
                    .error("no install path given and install.target_default is \"require\"");
                Err(InstallError::PathNotFound(options.cwd.clone()))
            }
        }
    }
}
