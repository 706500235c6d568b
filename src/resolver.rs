//! Install plan resolution.
//!
//! Maps a [`Platform`] to the concrete files an install must contain by
//! checking the configured artifact table against the build output. Required
//! artifacts that are absent abort resolution; optional ones are dropped from
//! the plan and reported as warnings.
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::{ArtifactKind, ArtifactSpec, DeployConfig};
use crate::error::{OptionalArtifactMissing, ResolveError};
use crate::install::ASSETS_SUBDIR;
use crate::logging::Log;
use crate::operations::FileSystemOps;
use crate::platform::Platform;

/// An artifact whose source was verified to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    /// Absolute source path inside the build output (or a library dir).
    pub source: PathBuf,
    /// File name inside the install directory.
    pub dest_name: String,
    /// Whether the artifact was required.
    pub required: bool,
    /// Artifact role.
    pub kind: ArtifactKind,
}

/// Everything one install copies, all sources verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    /// Flat files placed directly in the install directory, in table order.
    pub files: Vec<ResolvedArtifact>,
    /// Asset tree copied recursively to `<install>/assets`.
    pub assets: PathBuf,
    /// Optional artifacts that were skipped.
    pub warnings: Vec<OptionalArtifactMissing>,
}

impl InstallPlan {
    /// The application executable.
    #[must_use]
    pub fn executable(&self) -> Option<&ResolvedArtifact> {
        self.files.iter().find(|f| f.kind == ArtifactKind::Executable)
    }
}

/// Resolves install plans from the artifact table in [`DeployConfig`].
#[derive(Debug)]
pub struct DependencyResolver<'a> {
    config: &'a DeployConfig,
    project_root: &'a Path,
    fs: &'a dyn FileSystemOps,
}

impl<'a> DependencyResolver<'a> {
    /// Create a resolver for the project at `project_root`.
    #[must_use]
    pub const fn new(
        config: &'a DeployConfig,
        project_root: &'a Path,
        fs: &'a dyn FileSystemOps,
    ) -> Self {
        Self {
            config,
            project_root,
            fs,
        }
    }

    /// Resolve the plan for `platform` against the build output in `build_dir`.
    ///
    /// Each skipped optional artifact is logged as a warning and recorded in
    /// [`InstallPlan::warnings`].
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ArtifactMissing`] for the first required
    /// artifact not found at any candidate location, and
    /// [`ResolveError::AssetsMissing`] if the asset directory does not exist.
    pub fn resolve(
        &self,
        platform: Platform,
        build_dir: &Path,
        log: &dyn Log,
    ) -> Result<InstallPlan, ResolveError> {
        let mut files = Vec::new();
        let mut warnings = Vec::new();
        let mut seen = HashSet::from([ASSETS_SUBDIR.to_string()]);

        for spec in self.config.artifacts_for(platform) {
            match self.locate(&spec, build_dir) {
                Ok(source) => {
                    log.debug(&format!("{} -> {}", spec.dest_name(), source.display()));
                    seen.insert(spec.dest_name());
                    files.push(ResolvedArtifact {
                        source,
                        dest_name: spec.dest_name(),
                        required: spec.required,
                        kind: spec.kind,
                    });
                }
                Err(searched) if spec.required => {
                    return Err(ResolveError::ArtifactMissing {
                        artifact: spec.dest_name(),
                        searched,
                    });
                }
                Err(searched) => {
                    let warning = OptionalArtifactMissing {
                        artifact: spec.dest_name(),
                        path: searched.into_iter().next().unwrap_or_default(),
                    };
                    log.warn(&warning.to_string());
                    warnings.push(warning);
                }
            }
        }

        for dir in self.config.library_dirs_for(platform) {
            let dir = self.project_root.join(dir);
            self.collect_library_dir(&dir, &mut seen, &mut files, &mut warnings, log);
        }

        let assets = self.project_root.join(&self.config.project.assets_dir);
        if !self.fs.is_dir(&assets) {
            return Err(ResolveError::AssetsMissing(assets));
        }

        Ok(InstallPlan {
            files,
            assets,
            warnings,
        })
    }

    /// First existing candidate for `spec`, or every path that was tried.
    fn locate(&self, spec: &ArtifactSpec, build_dir: &Path) -> Result<PathBuf, Vec<PathBuf>> {
        let candidates = spec.candidates(build_dir);
        candidates
            .iter()
            .find(|p| self.fs.is_file(p))
            .cloned()
            .ok_or(candidates)
    }

    /// Add every file in a shipped library directory as an optional library.
    fn collect_library_dir(
        &self,
        dir: &Path,
        seen: &mut HashSet<String>,
        files: &mut Vec<ResolvedArtifact>,
        warnings: &mut Vec<OptionalArtifactMissing>,
        log: &dyn Log,
    ) {
        let entries = match self.fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(_) => {
                let warning = OptionalArtifactMissing {
                    artifact: dir
                        .file_name()
                        .map_or_else(String::new, |n| n.to_string_lossy().into_owned()),
                    path: dir.to_path_buf(),
                };
                log.warn(&warning.to_string());
                warnings.push(warning);
                return;
            }
        };

        for path in entries.into_iter().filter(|p| self.fs.is_file(p)) {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            if !seen.insert(name.clone()) {
                log.debug(&format!("{name} already planned, ignoring {}", path.display()));
                continue;
            }
            files.push(ResolvedArtifact {
                source: path,
                dest_name: name,
                required: false,
                kind: ArtifactKind::Library,
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use crate::operations::SystemFileSystemOps;
    use std::fs;

    struct Project {
        dir: tempfile::TempDir,
        config: DeployConfig,
    }

    impl Project {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("build")).unwrap();
            fs::create_dir_all(dir.path().join("assets/pieces")).unwrap();
            fs::write(dir.path().join("assets/pieces/king.png"), b"png").unwrap();
            let mut config = DeployConfig::default();
            config.project.app_name = "Game".to_string();
            Self { dir, config }
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn build(&self) -> PathBuf {
            self.root().join("build")
        }

        fn touch(&self, rel: &str) {
            let path = self.root().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, rel.as_bytes()).unwrap();
        }

        fn resolve(&self, platform: Platform) -> Result<InstallPlan, ResolveError> {
            let (log, _tmp, _guard) = isolated_logger();
            DependencyResolver::new(&self.config, self.root(), &SystemFileSystemOps).resolve(
                platform,
                &self.build(),
                &log,
            )
        }
    }

    #[test]
    fn posix_plan_contains_executable_and_assets() {
        let project = Project::new();
        project.touch("build/Game");

        let plan = project.resolve(Platform::Posix).unwrap();

        assert_eq!(plan.files.len(), 1);
        let exe = plan.executable().unwrap();
        assert_eq!(exe.source, project.build().join("Game"));
        assert_eq!(exe.dest_name, "Game");
        assert_eq!(plan.assets, project.root().join("assets"));
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn missing_executable_is_fatal() {
        let project = Project::new();
        let err = project.resolve(Platform::Posix).unwrap_err();
        assert!(
            matches!(&err, ResolveError::ArtifactMissing { artifact, .. } if artifact == "Game")
        );
    }

    #[test]
    fn windows_executable_found_in_release_subdir() {
        let project = Project::new();
        project.touch("build/Release/Game.exe");

        let plan = project.resolve(Platform::Windows).unwrap();
        assert_eq!(
            plan.executable().unwrap().source,
            project.build().join("Release").join("Game.exe")
        );
    }

    #[test]
    fn primary_location_wins_over_fallback() {
        let project = Project::new();
        project.touch("build/Game.exe");
        project.touch("build/Release/Game.exe");

        let plan = project.resolve(Platform::Windows).unwrap();
        assert_eq!(
            plan.executable().unwrap().source,
            project.build().join("Game.exe")
        );
    }

    #[test]
    fn missing_optional_libraries_only_warn() {
        let project = Project::new();
        project.touch("build/Game.exe");
        project.touch("build/openal32.dll");

        let plan = project.resolve(Platform::Windows).unwrap();

        let names: Vec<&str> = plan.files.iter().map(|f| f.dest_name.as_str()).collect();
        assert_eq!(names, ["Game.exe", "openal32.dll"]);
        // Four SFML libraries plus the absent extra library directory.
        assert_eq!(plan.warnings.len(), 5);
        assert!(
            plan.warnings
                .iter()
                .any(|w| w.artifact == "sfml-audio-2.dll")
        );
    }

    #[test]
    fn every_planned_file_exists() {
        let project = Project::new();
        project.touch("build/Game.exe");
        for dll in crate::config::artifacts::WINDOWS_RUNTIME_LIBRARIES {
            project.touch(&format!("build/{dll}"));
        }
        project.touch("external/RELEASE-DLL-Windows/libstdc++-6.dll");

        let plan = project.resolve(Platform::Windows).unwrap();

        assert_eq!(plan.files.len(), 7);
        assert!(plan.files.iter().all(|f| f.source.is_file()));
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn library_dir_does_not_shadow_build_output() {
        let project = Project::new();
        project.touch("build/Game.exe");
        project.touch("build/openal32.dll");
        project.touch("external/RELEASE-DLL-Windows/openal32.dll");

        let plan = project.resolve(Platform::Windows).unwrap();
        let openal: Vec<_> = plan
            .files
            .iter()
            .filter(|f| f.dest_name == "openal32.dll")
            .collect();
        assert_eq!(openal.len(), 1);
        assert_eq!(openal[0].source, project.build().join("openal32.dll"));
    }

    #[test]
    fn library_dir_file_named_like_assets_dir_is_ignored() {
        let project = Project::new();
        project.touch("build/Game.exe");
        project.touch("external/RELEASE-DLL-Windows/assets");

        let plan = project.resolve(Platform::Windows).unwrap();

        assert!(plan.files.iter().all(|f| f.dest_name != ASSETS_SUBDIR));
    }

    #[test]
    fn missing_assets_is_fatal() {
        let project = Project::new();
        project.touch("build/Game");
        fs::remove_dir_all(project.root().join("assets")).unwrap();

        let err = project.resolve(Platform::Posix).unwrap_err();
        assert!(matches!(err, ResolveError::AssetsMissing(_)));
    }

    #[test]
    fn directory_at_artifact_path_does_not_count() {
        let project = Project::new();
        fs::create_dir_all(project.build().join("Game")).unwrap();
        assert!(project.resolve(Platform::Posix).is_err());
    }
}
