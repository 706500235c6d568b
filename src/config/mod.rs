//! Project configuration loaded from `deploy.toml`.
//!
//! Every section is optional; an absent file yields the built-in layout of
//! the desktop application this tool was written for.
pub mod artifacts;
pub mod toml_loader;

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::install::ASSETS_SUBDIR;
use crate::platform::Platform;

pub use artifacts::{ArtifactKind, ArtifactSpec};

/// Default config file name, relative to the project root.
pub const CONFIG_FILE: &str = "deploy.toml";

/// Product name used when `deploy.toml` does not name one.
pub const DEFAULT_APP_NAME: &str = "Tamerlane-Chess";

/// Complete deploy configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    /// Project layout.
    pub project: ProjectConfig,
    /// Build tool invocation.
    pub build: BuildConfig,
    /// Install behaviour.
    pub install: InstallConfig,
    /// Artifact tables per platform; a platform without an entry uses
    /// [`artifacts::default_artifacts`].
    pub artifacts: PerPlatform<Vec<ArtifactSpec>>,
    /// Extra directories (relative to the project root) whose files are all
    /// installed next to the executable; a platform without an entry uses
    /// [`artifacts::default_library_dirs`].
    pub library_dirs: PerPlatform<Vec<PathBuf>>,
}

/// A value that may be overridden separately for each [`Platform`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerPlatform<T> {
    /// Windows override.
    pub windows: Option<T>,
    /// POSIX override.
    pub posix: Option<T>,
}

impl<T> Default for PerPlatform<T> {
    fn default() -> Self {
        Self {
            windows: None,
            posix: None,
        }
    }
}

impl<T> PerPlatform<T> {
    /// Override for `platform`, if one was configured.
    #[must_use]
    pub const fn get(&self, platform: Platform) -> Option<&T> {
        match platform {
            Platform::Windows => self.windows.as_ref(),
            Platform::Posix => self.posix.as_ref(),
        }
    }

    /// Configured overrides with their platform.
    pub fn iter(&self) -> impl Iterator<Item = (Platform, &T)> {
        [
            (Platform::Windows, self.windows.as_ref()),
            (Platform::Posix, self.posix.as_ref()),
        ]
        .into_iter()
        .filter_map(|(p, v)| v.map(|v| (p, v)))
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Product name; also the install directory name.
    pub app_name: String,
    /// Build output directory, relative to the project root.
    pub build_dir: PathBuf,
    /// Asset source directory, relative to the project root.
    pub assets_dir: PathBuf,
    /// CMake build type (e.g. `Release`); `None` leaves it to the generator.
    pub build_type: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            build_dir: PathBuf::from("build"),
            assets_dir: PathBuf::from("assets"),
            build_type: None,
        }
    }
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Build tool executable.
    pub program: String,
    /// Generator passed with `-G` on Windows.
    pub windows_generator: Option<String>,
    /// Extra arguments for the configure step.
    pub configure_args: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            program: "cmake".to_string(),
            windows_generator: Some("MinGW Makefiles".to_string()),
            configure_args: Vec::new(),
        }
    }
}

/// What `install` does when no target path is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetDefault {
    /// Use the current working directory without asking.
    Cwd,
    /// Ask the confirmation policy before using the current working directory.
    #[default]
    Prompt,
    /// Refuse; a path must be given.
    Require,
}

/// `[install]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallConfig {
    /// Target-path default policy.
    pub target_default: TargetDefault,
}

impl DeployConfig {
    /// Load `path` (or defaults if it does not exist) and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if
    /// [`validate`](Self::validate) rejects it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml_loader::load_or_default(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Check semantic rules that the TOML schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = &self.project.app_name;
        if name.trim().is_empty() {
            return Err(ConfigError::Invalid("project.app_name is empty".to_string()));
        }
        if !is_single_component(name) {
            return Err(ConfigError::Invalid(format!(
                "project.app_name '{name}' must be a single path component"
            )));
        }
        if self.build.program.trim().is_empty() {
            return Err(ConfigError::Invalid("build.program is empty".to_string()));
        }

        for (platform, specs) in self.artifacts.iter() {
            let executables: Vec<&ArtifactSpec> = specs
                .iter()
                .filter(|s| s.kind == ArtifactKind::Executable)
                .collect();
            match executables.as_slice() {
                [exe] if exe.required => {}
                [_] => {
                    return Err(ConfigError::Invalid(format!(
                        "artifacts.{platform}: the executable must be required"
                    )));
                }
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "artifacts.{platform}: expected exactly one executable, found {}",
                        executables.len()
                    )));
                }
            }
            if let Some(spec) = specs.iter().find(|s| s.source.is_absolute()) {
                return Err(ConfigError::Invalid(format!(
                    "artifacts.{platform}: source {} must be relative to the build directory",
                    spec.source.display()
                )));
            }
            for spec in specs {
                let dest = spec.dest_name();
                if !is_single_component(&dest) || dest == ASSETS_SUBDIR {
                    return Err(ConfigError::Invalid(format!(
                        "artifacts.{platform}: install name '{dest}' must be a single file name \
                         other than '{ASSETS_SUBDIR}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Artifact table for `platform`.
    #[must_use]
    pub fn artifacts_for(&self, platform: Platform) -> Vec<ArtifactSpec> {
        self.artifacts.get(platform).cloned().unwrap_or_else(|| {
            artifacts::default_artifacts(platform, &self.project.app_name)
        })
    }

    /// Extra library directories for `platform`, relative to the project root.
    #[must_use]
    pub fn library_dirs_for(&self, platform: Platform) -> Vec<PathBuf> {
        self.library_dirs
            .get(platform)
            .cloned()
            .unwrap_or_else(|| artifacts::default_library_dirs(platform))
    }
}

/// `name` is exactly one normal path component (no separators, `.` or `..`).
fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
