//! Configure-then-build driver for the external build tool.
use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::error::{BuildError, BuildStep};
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::Platform;

/// Outcome of one [`BuildInvoker::build`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildResult {
    /// Both steps exited 0.
    pub succeeded: bool,
    /// Exit code of the last step run (`-1` when killed by a signal).
    pub exit_code: i32,
    /// Step that failed, if any.
    pub failed_step: Option<BuildStep>,
}

impl BuildResult {
    /// Convert a failed result into the matching [`BuildError`].
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Failed`] when the build did not succeed.
    pub fn into_result(self) -> Result<(), BuildError> {
        match self.failed_step {
            Some(step) if !self.succeeded => Err(BuildError::Failed {
                step,
                exit_code: self.exit_code,
            }),
            _ => Ok(()),
        }
    }
}

/// Runs the build tool's two-step protocol in a scratch output directory.
#[derive(Debug)]
pub struct BuildInvoker<'a> {
    source_dir: PathBuf,
    build_dir: PathBuf,
    config: &'a BuildConfig,
    build_type: Option<&'a str>,
    platform: Platform,
    executor: &'a dyn Executor,
}

impl<'a> BuildInvoker<'a> {
    /// Create an invoker that configures `source_dir` into `build_dir`.
    #[must_use]
    pub fn new(
        source_dir: &Path,
        build_dir: &Path,
        config: &'a BuildConfig,
        platform: Platform,
        executor: &'a dyn Executor,
    ) -> Self {
        Self {
            source_dir: source_dir.to_path_buf(),
            build_dir: build_dir.to_path_buf(),
            config,
            build_type: None,
            platform,
            executor,
        }
    }

    /// Request a specific build type (`Release`, `Debug`, ...).
    #[must_use]
    pub const fn build_type(mut self, build_type: Option<&'a str>) -> Self {
        self.build_type = build_type;
        self
    }

    /// Arguments for the configure step.
    #[must_use]
    pub fn configure_args(&self) -> Vec<String> {
        let mut args = vec![self.source_dir.display().to_string()];
        if let Some(generator) = self
            .platform
            .generator(self.config.windows_generator.as_deref())
        {
            args.extend(["-G".to_string(), generator.to_string()]);
        }
        if let Some(build_type) = self.build_type {
            args.push(format!("-DCMAKE_BUILD_TYPE={build_type}"));
        }
        args.extend(self.config.configure_args.iter().cloned());
        args
    }

    /// Arguments for the build step.
    #[must_use]
    pub fn compile_args(&self) -> Vec<String> {
        let mut args = vec!["--build".to_string(), ".".to_string()];
        if let Some(build_type) = self.build_type {
            args.extend(["--config".to_string(), build_type.to_string()]);
        }
        args
    }

    /// Recreate the output directory, then configure and build.
    ///
    /// A non-zero exit is reported in the returned [`BuildResult`]; the
    /// build step is skipped when configure fails. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::ToolNotFound`] if the build program is not on
    /// `PATH`, [`BuildError::Scratch`] if the output directory cannot be
    /// reset and [`BuildError::Spawn`] if a step cannot be started.
    pub fn build(&self, log: &dyn Log) -> Result<BuildResult, BuildError> {
        let program = self.config.program.as_str();
        match self.executor.which(program) {
            Some(path) => log.debug(&format!("using {}", path.display())),
            None => {
                return Err(BuildError::ToolNotFound {
                    program: program.to_string(),
                });
            }
        }

        self.reset_build_dir(log)?;

        for (step, args) in [
            (BuildStep::Configure, self.configure_args()),
            (BuildStep::Compile, self.compile_args()),
        ] {
            log.info(&format!("{step}: {program} {}", args.join(" ")));
            let result = self
                .executor
                .run_in(&self.build_dir, program, &args)
                .map_err(|e| BuildError::Spawn {
                    step,
                    source: e.into(),
                })?;
            if !result.success {
                log.error(&format!(
                    "{step} step exited with code {}",
                    result.exit_code()
                ));
                return Ok(BuildResult {
                    succeeded: false,
                    exit_code: result.exit_code(),
                    failed_step: Some(step),
                });
            }
        }

        Ok(BuildResult {
            succeeded: true,
            exit_code: 0,
            failed_step: None,
        })
    }

    /// Delete a stale output directory (and its cached configuration) and
    /// create an empty one.
    fn reset_build_dir(&self, log: &dyn Log) -> Result<(), BuildError> {
        let scratch = |source| BuildError::Scratch {
            path: self.build_dir.clone(),
            source,
        };
        if self.build_dir.exists() {
            log.debug(&format!("removing {}", self.build_dir.display()));
            std::fs::remove_dir_all(&self.build_dir).map_err(scratch)?;
        }
        std::fs::create_dir_all(&self.build_dir).map_err(scratch)
    }
}
